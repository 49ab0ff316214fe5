//! Network-shaped request and response values exchanged with the front door

pub mod request;
pub mod response;

pub use request::{Headers, ProxyEvent};
pub use response::{make_response, HeaderValue, ProxyResponse, ResponseHeaders};
