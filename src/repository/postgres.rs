//! PostgreSQL backend

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{FleetSnapshot, FleetStore, FleetTx, Party};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Assignment, Client, User, Vehicle},
};

/// Map a unique-index violation to `Conflict`, anything else to `Database`
fn unique_conflict(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message()),
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to run database migrations: {}", e)))
    }
}

#[async_trait]
impl FleetStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn FleetTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn snapshot(&self) -> AppResult<FleetSnapshot> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles")
            .fetch_all(&mut *tx)
            .await?;
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients")
            .fetch_all(&mut *tx)
            .await?;
        let assignments = sqlx::query_as::<_, Assignment>("SELECT * FROM assignments")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(FleetSnapshot {
            vehicles,
            clients,
            assignments,
        })
    }

    async fn client_snapshot(&self, client_id: Uuid) -> AppResult<Option<FleetSnapshot>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(client) = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let assignments =
            sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE client_id = $1")
                .bind(client_id)
                .fetch_all(&mut *tx)
                .await?;
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE id IN (SELECT vehicle_id FROM assignments WHERE client_id = $1)
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(FleetSnapshot {
            vehicles,
            clients: vec![client],
            assignments,
        }))
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    async fn get_assignment(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(assignment)
    }

    async fn user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        sqlx::query("INSERT INTO users (id, username, password, created_at) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_conflict(e, || format!("Username '{}' already exists", user.username)))?;
        Ok(())
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }
}

/// Write transaction. Rows read through `*_for_update` stay locked until
/// commit or rollback.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl FleetTx for PgTx {
    async fn vehicle_for_update(&mut self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(vehicle)
    }

    async fn client_for_update(&mut self, id: Uuid) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(client)
    }

    async fn assignment_for_update(&mut self, id: Uuid) -> AppResult<Option<Assignment>> {
        let assignment =
            sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(assignment)
    }

    async fn insert_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, license_plate, make, model, vehicle_type, location, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.vehicle_type)
        .bind(&vehicle.location)
        .bind(vehicle.status)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_conflict(e, || format!("License plate {} already exists", vehicle.license_plate)))?;
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET license_plate = $2, make = $3, model = $4, vehicle_type = $5, location = $6, status = $7
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.vehicle_type)
        .bind(&vehicle.location)
        .bind(vehicle.status)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_conflict(e, || format!("License plate {} already exists", vehicle.license_plate)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Vehicle {} not found", vehicle.id)));
        }
        Ok(())
    }

    async fn delete_vehicle(&mut self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Vehicle {} not found", id)));
        }
        Ok(())
    }

    async fn insert_client(&mut self, client: &Client) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, first_name, last_name, cin, client_type, location, phone, cin_image, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.cin)
        .bind(client.client_type)
        .bind(&client.location)
        .bind(&client.phone)
        .bind(&client.cin_image)
        .bind(client.available)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_conflict(e, || format!("CIN {} already exists", client.cin)))?;
        Ok(())
    }

    async fn save_client(&mut self, client: &Client) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET first_name = $2, last_name = $3, cin = $4, client_type = $5,
                location = $6, phone = $7, cin_image = $8, available = $9
            WHERE id = $1
            "#,
        )
        .bind(client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.cin)
        .bind(client.client_type)
        .bind(&client.location)
        .bind(&client.phone)
        .bind(&client.cin_image)
        .bind(client.available)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| unique_conflict(e, || format!("CIN {} already exists", client.cin)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", client.id)));
        }
        Ok(())
    }

    async fn delete_client(&mut self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", id)));
        }
        Ok(())
    }

    async fn insert_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assignments (id, vehicle_id, client_id, start_date, end_date, status, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.vehicle_id)
        .bind(assignment.client_id)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.status)
        .bind(&assignment.notes)
        .bind(assignment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            unique_conflict(e, || "vehicle or client already has an active assignment".to_string())
        })?;
        Ok(())
    }

    async fn save_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET status = $2, end_date = $3, notes = $4
            WHERE id = $1
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.status)
        .bind(assignment.end_date)
        .bind(&assignment.notes)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Assignment {} not found", assignment.id)));
        }
        Ok(())
    }

    async fn assignments_of(&mut self, party: Party) -> AppResult<Vec<Assignment>> {
        let query = match party {
            Party::Vehicle(_) => "SELECT * FROM assignments WHERE vehicle_id = $1",
            Party::Client(_) => "SELECT * FROM assignments WHERE client_id = $1",
        };
        let (Party::Vehicle(id) | Party::Client(id)) = party;
        let assignments = sqlx::query_as::<_, Assignment>(query)
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(assignments)
    }

    async fn delete_assignments_of(&mut self, party: Party) -> AppResult<u64> {
        let query = match party {
            Party::Vehicle(_) => "DELETE FROM assignments WHERE vehicle_id = $1",
            Party::Client(_) => "DELETE FROM assignments WHERE client_id = $1",
        };
        let (Party::Vehicle(id) | Party::Client(id)) = party;
        let result = sqlx::query(query).bind(id).execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
