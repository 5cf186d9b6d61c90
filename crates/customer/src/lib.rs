pub mod bootstrap;
pub mod directory;
pub mod rpc_server;

pub use directory::CustomerDirectory;
pub use rpc_server::{CustomerRpcServer, RpcServerHandle};
