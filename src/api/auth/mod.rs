mod credentials;
pub(crate) mod refresh;
mod session;
mod transport;

pub use credentials::{
    clear_credentials, load_credentials, store_credentials, CredentialPair, CredentialStore,
    MemoryCredentialStore, SqliteCredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
pub use session::{AuthSession, RegistrationRequest, UserProfile};
pub use transport::{ApiRequest, AuthenticatedTransport, MultipartForm, RequestBody};
