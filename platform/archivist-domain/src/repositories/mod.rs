mod api_gateway;
mod artifact_store;
mod language_model;
mod state_store;

pub use api_gateway::{ApiGateway, AuthToken, BookmarksPage, Credentials, UserIdentity};
pub use artifact_store::{ArtifactKind, ArtifactReader, ArtifactWriter};
pub use language_model::{LanguageModelProvider, LmOptions};
pub use state_store::ExportStateStore;
