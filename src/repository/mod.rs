//! Repository layer: the storage contract and its backends.
//!
//! Reads go straight to a [`FleetStore`]. Every write goes through a
//! [`FleetTx`], which locks the rows it reads (`*_for_update`) until it is
//! committed. A transaction dropped without [`FleetTx::commit`] rolls back.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Assignment, Client, User, Vehicle},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to the configured backend
pub type Repository = Arc<dyn FleetStore>;

/// The entity an assignment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Vehicle(Uuid),
    Client(Uuid),
}

impl Party {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        match self {
            Party::Vehicle(id) => assignment.vehicle_id == *id,
            Party::Client(id) => assignment.client_id == *id,
        }
    }
}

/// Records read together in one consistent view
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub vehicles: Vec<Vehicle>,
    pub clients: Vec<Client>,
    pub assignments: Vec<Assignment>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Cheap connectivity check
    async fn ping(&self) -> AppResult<()>;

    /// Open a write transaction
    async fn begin(&self) -> AppResult<Box<dyn FleetTx>>;

    /// All vehicles, clients and assignments as of one instant
    async fn snapshot(&self) -> AppResult<FleetSnapshot>;

    /// One client, its assignments and the vehicles they reference.
    /// `None` when the client does not exist.
    async fn client_snapshot(&self, client_id: Uuid) -> AppResult<Option<FleetSnapshot>>;

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>>;
    async fn get_assignment(&self, id: Uuid) -> AppResult<Option<Assignment>>;

    async fn user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Fails with `Conflict` if the username is taken
    async fn insert_user(&self, user: &User) -> AppResult<()>;
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

/// A unit of work over vehicles, clients and assignments
#[async_trait]
pub trait FleetTx: Send {
    async fn vehicle_for_update(&mut self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn client_for_update(&mut self, id: Uuid) -> AppResult<Option<Client>>;
    async fn assignment_for_update(&mut self, id: Uuid) -> AppResult<Option<Assignment>>;

    /// Fails with `Conflict` if the license plate is taken
    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;
    /// Fails with `Conflict` if the new license plate is taken
    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()>;
    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<()>;

    /// Fails with `Conflict` if the CIN is taken, ignoring case
    async fn insert_client(&mut self, client: &Client) -> AppResult<()>;
    /// Fails with `Conflict` if the new CIN is taken, ignoring case
    async fn save_client(&mut self, client: &Client) -> AppResult<()>;
    async fn delete_client(&mut self, id: Uuid) -> AppResult<()>;

    async fn insert_assignment(&mut self, assignment: &Assignment) -> AppResult<()>;
    async fn save_assignment(&mut self, assignment: &Assignment) -> AppResult<()>;
    /// Assignments referencing `party`, any status
    async fn assignments_of(&mut self, party: Party) -> AppResult<Vec<Assignment>>;
    /// Remove every assignment referencing `party`, returning how many went
    async fn delete_assignments_of(&mut self, party: Party) -> AppResult<u64>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
