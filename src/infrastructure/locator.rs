// Backend URL derivation from the dashboard's own location
use url::Url;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LocatorError {
    #[error("invalid location: {0}")]
    Parse(#[from] url::ParseError),

    #[error("location {0:?} has no host to carry a port")]
    NoHost(String),
}

/// Same scheme and host as the dashboard, backend port substituted.
#[derive(Debug, Clone)]
pub struct ServerLocator {
    base: Url,
}

impl ServerLocator {
    pub fn new(location: &str, backend_port: u16) -> Result<Self, LocatorError> {
        let mut base = Url::parse(location)?;
        base.set_port(Some(backend_port))
            .map_err(|_| LocatorError::NoHost(location.to_string()))?;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// Fresh URL for `path` with an empty query for the caller to extend.
    pub fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}
