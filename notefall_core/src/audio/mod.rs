pub mod assets;
pub mod stream;
pub mod transport;

pub use stream::{PlaybackCursor, StreamTransport};
pub use transport::{AudioPosition, AudioTransport, TransportError};
