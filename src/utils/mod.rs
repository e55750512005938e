pub mod net;
pub mod slot;
pub mod sos;
