//! Camada de transporte HTTP: campos de formulário, anexos e o trait consumido pelo cliente.

pub mod form;
pub mod http;

pub use form::{FileAttachment, FormData, FormValue};
pub use http::{HttpTransport, ReqwestTransport};
