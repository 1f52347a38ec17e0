pub mod compose;
pub mod domain;
pub mod pagination;
pub mod ports;
pub mod selection;

pub use domain::{
    AuthSession, Message, NewMessage, Store, StoreSnapshot, StoreStatus, User, UserCredentials,
};
pub use ports::{DatabaseService, PortError, PortResult};
