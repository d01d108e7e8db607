//! Настройки сервиса из переменных окружения

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;

use crate::preprocessing::ElementTable;

pub const HOST_VAR: &str = "DESCRIPTOR_HOST";
pub const PORT_VAR: &str = "DESCRIPTOR_PORT";
pub const ELEMENTS_VAR: &str = "DESCRIPTOR_ELEMENTS";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    /// JSON-таблица свойств элементов; без нее таблица пустая
    pub elements_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            elements_path: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(host) = get(HOST_VAR) {
            config.host = host
                .parse()
                .with_context(|| format!("invalid {} '{}'", HOST_VAR, host))?;
        }
        if let Some(port) = get(PORT_VAR) {
            config.port = port
                .parse()
                .with_context(|| format!("invalid {} '{}'", PORT_VAR, port))?;
        }
        config.elements_path = get(ELEMENTS_VAR).filter(|p| !p.is_empty()).map(PathBuf::from);

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn load_elements(&self) -> anyhow::Result<ElementTable> {
        match &self.elements_path {
            Some(path) => ElementTable::from_path(path)
                .with_context(|| format!("failed to load element table from {}", path.display())),
            None => Ok(ElementTable::new()),
        }
    }
}
