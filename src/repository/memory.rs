//! In-memory backend for development and tests.
//!
//! A transaction owns the fleet write lock for its whole lifetime and works
//! on a staged copy of the state. Commit swaps the copy in; dropping the
//! transaction discards it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::{FleetSnapshot, FleetStore, FleetTx, Party};
use crate::{
    error::{AppError, AppResult},
    models::{client::cin_key, Assignment, Client, User, Vehicle},
};

#[derive(Debug, Clone, Default)]
struct FleetState {
    vehicles: HashMap<Uuid, Vehicle>,
    clients: HashMap<Uuid, Client>,
    assignments: HashMap<Uuid, Assignment>,
}

#[derive(Default)]
pub struct MemoryStore {
    fleet: Arc<RwLock<FleetState>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn FleetTx>> {
        let guard = self.fleet.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }

    async fn snapshot(&self) -> AppResult<FleetSnapshot> {
        let state = self.fleet.read().await;
        Ok(FleetSnapshot {
            vehicles: state.vehicles.values().cloned().collect(),
            clients: state.clients.values().cloned().collect(),
            assignments: state.assignments.values().cloned().collect(),
        })
    }

    async fn client_snapshot(&self, client_id: Uuid) -> AppResult<Option<FleetSnapshot>> {
        let state = self.fleet.read().await;
        let Some(client) = state.clients.get(&client_id) else {
            return Ok(None);
        };
        let assignments: Vec<Assignment> = state
            .assignments
            .values()
            .filter(|a| a.client_id == client_id)
            .cloned()
            .collect();
        let vehicle_ids: HashSet<Uuid> = assignments.iter().map(|a| a.vehicle_id).collect();
        let vehicles = vehicle_ids
            .iter()
            .filter_map(|id| state.vehicles.get(id).cloned())
            .collect();

        Ok(Some(FleetSnapshot {
            vehicles,
            clients: vec![client.clone()],
            assignments,
        }))
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.fleet.read().await.vehicles.get(&id).cloned())
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        Ok(self.fleet.read().await.clients.get(&id).cloned())
    }

    async fn get_assignment(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        Ok(self.fleet.read().await.assignments.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!("Username '{}' already exists", user.username)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.password = password_hash.to_string();
        Ok(())
    }
}

pub struct MemoryTx {
    guard: OwnedRwLockWriteGuard<FleetState>,
    staged: FleetState,
}

impl MemoryTx {
    fn check_plate(&self, vehicle: &Vehicle) -> AppResult<()> {
        let taken = self
            .staged
            .vehicles
            .values()
            .any(|v| v.id != vehicle.id && v.license_plate == vehicle.license_plate);
        if taken {
            return Err(AppError::Conflict(format!(
                "License plate {} already exists",
                vehicle.license_plate
            )));
        }
        Ok(())
    }

    fn check_cin(&self, client: &Client) -> AppResult<()> {
        let key = cin_key(&client.cin);
        let taken = self
            .staged
            .clients
            .values()
            .any(|c| c.id != client.id && cin_key(&c.cin) == key);
        if taken {
            return Err(AppError::Conflict(format!("CIN {} already exists", client.cin)));
        }
        Ok(())
    }

    /// Mirrors the foreign keys and partial unique indexes of the SQL schema
    fn check_assignment(&self, assignment: &Assignment) -> AppResult<()> {
        if !self.staged.vehicles.contains_key(&assignment.vehicle_id)
            || !self.staged.clients.contains_key(&assignment.client_id)
        {
            return Err(AppError::Internal(format!(
                "assignment {} references a missing vehicle or client",
                assignment.id
            )));
        }
        if assignment.is_active() {
            let clash = self.staged.assignments.values().any(|a| {
                a.id != assignment.id
                    && a.is_active()
                    && (a.vehicle_id == assignment.vehicle_id || a.client_id == assignment.client_id)
            });
            if clash {
                return Err(AppError::Conflict(
                    "vehicle or client already has an active assignment".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_unreferenced(&self, party: Party) -> AppResult<()> {
        if self.staged.assignments.values().any(|a| party.matches(a)) {
            return Err(AppError::Internal(format!("{:?} is still referenced by assignments", party)));
        }
        Ok(())
    }
}

#[async_trait]
impl FleetTx for MemoryTx {
    async fn vehicle_for_update(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.staged.vehicles.get(&id).cloned())
    }

    async fn client_for_update(&mut self, id: Uuid) -> AppResult<Option<Client>> {
        Ok(self.staged.clients.get(&id).cloned())
    }

    async fn assignment_for_update(&mut self, id: Uuid) -> AppResult<Option<Assignment>> {
        Ok(self.staged.assignments.get(&id).cloned())
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        self.check_plate(vehicle)?;
        self.staged.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        if !self.staged.vehicles.contains_key(&vehicle.id) {
            return Err(AppError::NotFound(format!("Vehicle {} not found", vehicle.id)));
        }
        self.check_plate(vehicle)?;
        self.staged.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<()> {
        self.check_unreferenced(Party::Vehicle(id))?;
        self.staged
            .vehicles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))
    }

    async fn insert_client(&mut self, client: &Client) -> AppResult<()> {
        self.check_cin(client)?;
        self.staged.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn save_client(&mut self, client: &Client) -> AppResult<()> {
        if !self.staged.clients.contains_key(&client.id) {
            return Err(AppError::NotFound(format!("Client {} not found", client.id)));
        }
        self.check_cin(client)?;
        self.staged.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn delete_client(&mut self, id: Uuid) -> AppResult<()> {
        self.check_unreferenced(Party::Client(id))?;
        self.staged
            .clients
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
    }

    async fn insert_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        self.check_assignment(assignment)?;
        self.staged.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn save_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        if !self.staged.assignments.contains_key(&assignment.id) {
            return Err(AppError::NotFound(format!("Assignment {} not found", assignment.id)));
        }
        self.check_assignment(assignment)?;
        self.staged.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn assignments_of(&mut self, party: Party) -> AppResult<Vec<Assignment>> {
        Ok(self
            .staged
            .assignments
            .values()
            .filter(|a| party.matches(a))
            .cloned()
            .collect())
    }

    async fn delete_assignments_of(&mut self, party: Party) -> AppResult<u64> {
        let before = self.staged.assignments.len();
        self.staged.assignments.retain(|_, a| !party.matches(a));
        Ok((before - self.staged.assignments.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
