pub use crate::error::ExtractorError;
pub use crate::extractor_config::{SiteConfig, DEFAULT_SITES};
pub use crate::registry::SiteRegistry;
pub use crate::settings::{SiteSettings, ACCESS_TOKEN};
pub use crate::sites::{Category, Credential, SiteAdapter, SiteCapabilities, StarOutcome};
pub use crate::transport::{HttpRequest, HttpTransport, Transport};

#[cfg(feature = "moebooru")]
pub use crate::sites::konachan::MoebooruAdapter;
#[cfg(feature = "sankaku")]
pub use crate::sites::sankaku::SankakuAdapter;
