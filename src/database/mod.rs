pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryGateway;
pub use postgres::PgGateway;
pub use repository::{
    FranchiseRepository, Gateway, MenuRepository, OrderRepository, SessionRepository, UserRepository,
};
