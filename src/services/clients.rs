//! Client service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        client::{Client, ClientQuery, ClientWithAssignment, CreateClient, UpdateClient},
        AssignmentWithDetails,
    },
    projection,
    repository::{FleetSnapshot, Party, Repository},
};

#[derive(Clone)]
pub struct ClientsService {
    repository: Repository,
}

impl ClientsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Clients with a description of the vehicle they hold, optionally
    /// narrowed to one CIN
    pub async fn list(&self, query: &ClientQuery) -> AppResult<Vec<ClientWithAssignment>> {
        let snapshot = self.repository.snapshot().await?;
        let views = projection::client_views(&snapshot);
        Ok(match query.cin.as_deref() {
            Some(cin) => views.into_iter().filter(|v| v.client.has_cin(cin)).collect(),
            None => views,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Client>> {
        self.repository.get_client(id).await
    }

    pub async fn create(&self, data: CreateClient) -> AppResult<Client> {
        let client = data.into_client()?;

        let mut tx = self.repository.begin().await?;
        tx.insert_client(&client).await?;
        tx.commit().await?;

        tracing::info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn update(&self, id: Uuid, data: UpdateClient) -> AppResult<Client> {
        let mut tx = self.repository.begin().await?;
        let mut client = tx
            .client_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;

        data.apply_to(&mut client)?;
        tx.save_client(&client).await?;
        tx.commit().await?;

        tracing::info!(client_id = %id, "Client updated");
        Ok(client)
    }

    /// Delete a client, under the same rules as vehicle deletion
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        tx.client_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;

        let history = tx.assignments_of(Party::Client(id)).await?;
        if history.iter().any(|a| a.is_active()) {
            return Err(AppError::Conflict("client has an active assignment".to_string()));
        }
        if !history.is_empty() {
            if !force {
                return Err(AppError::Conflict(format!(
                    "client is referenced by {} past assignments",
                    history.len()
                )));
            }
            let removed = tx.delete_assignments_of(Party::Client(id)).await?;
            tracing::warn!(client_id = %id, removed, "Removing assignment history with client");
        }

        tx.delete_client(id).await?;
        tx.commit().await?;

        tracing::info!(client_id = %id, "Client deleted");
        Ok(())
    }

    async fn snapshot_of(&self, client_id: Uuid) -> AppResult<FleetSnapshot> {
        self.repository
            .client_snapshot(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))
    }

    /// The client's active assignment, or `None`
    pub async fn current_assignment(&self, client_id: Uuid) -> AppResult<Option<AssignmentWithDetails>> {
        let snapshot = self.snapshot_of(client_id).await?;
        Ok(projection::active_assignment_for_client(&snapshot, client_id))
    }

    /// The client's completed assignments, newest first
    pub async fn assignment_history(&self, client_id: Uuid) -> AppResult<Vec<AssignmentWithDetails>> {
        let snapshot = self.snapshot_of(client_id).await?;
        Ok(projection::assignment_history_for_client(&snapshot, client_id))
    }
}
