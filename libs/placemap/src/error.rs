use miette::Diagnostic;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::surface::MarkerHandle;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config not found")]
    #[diagnostic(help = "pass --config, set PLACEMAP_CONFIG or create ./placemap.toml")]
    ConfigNotFound,
    #[error("toml parsing failed")]
    Toml(#[from] toml::de::Error),
    #[error("missing credential {0}")]
    #[diagnostic(code = "placemap::missing_credential")]
    MissingCredential(&'static str),
    #[error("http error {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("neighborhood pin {0} is still registered")]
    PinAlreadyRegistered(MarkerHandle),
    #[error("lookup channel closed")]
    LookupChannelClosed,
}
