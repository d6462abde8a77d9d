//! PostgreSQL backend tests
//!
//! Need a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::sync::Arc;

use uuid::Uuid;

use fleet_server::{
    config::{AuthConfig, DatabaseConfig},
    error::AppError,
    models::{
        assignment::CreateAssignment, client::CreateClient, vehicle::CreateVehicle, Client,
        Vehicle, VehicleStatus,
    },
    repository::{FleetStore, PgStore, Repository},
    services::Services,
};

async fn services() -> (Services, Arc<PgStore>) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let config = DatabaseConfig {
        url,
        max_connections: 16,
        min_connections: 1,
    };
    let store = Arc::new(PgStore::connect(&config).await.expect("Failed to connect"));
    store.migrate().await.expect("Failed to migrate");
    let repository: Repository = store.clone();
    (Services::new(repository, AuthConfig::default()), store)
}

/// Unique per run so tests can share a database
fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_uppercase()
}

async fn vehicle(services: &Services) -> Vehicle {
    services
        .vehicles
        .create(CreateVehicle {
            license_plate: format!("T-{}", tag()),
            make: "Hyundai".to_string(),
            model: "Accent".to_string(),
            vehicle_type: "sedan".to_string(),
            location: "Meknes".to_string(),
            status: None,
        })
        .await
        .expect("Failed to create vehicle")
}

async fn client(services: &Services) -> Client {
    services
        .clients
        .create(CreateClient {
            first_name: "Test".to_string(),
            last_name: "Client".to_string(),
            cin: format!("Z{}", tag()),
            client_type: "new".to_string(),
            location: "Meknes".to_string(),
            phone: "0600000000".to_string(),
            cin_image: None,
        })
        .await
        .expect("Failed to create client")
}

#[tokio::test]
#[ignore]
async fn test_ping() {
    let (_, store) = services().await;
    store.ping().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_cin_conflict_ignores_case() {
    let (services, _) = services().await;
    let existing = client(&services).await;

    let err = services
        .clients
        .create(CreateClient {
            first_name: "Other".to_string(),
            last_name: "Person".to_string(),
            cin: existing.cin.to_lowercase(),
            client_type: "existing".to_string(),
            location: "Meknes".to_string(),
            phone: "0600000001".to_string(),
            cin_image: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_lifecycle_round_trip() {
    let (services, _) = services().await;
    let v = vehicle(&services).await;
    let c = client(&services).await;

    let a = services
        .assignments
        .create(CreateAssignment {
            vehicle_id: v.id,
            client_id: c.id,
            notes: Some("weekly rental".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(
        services.vehicles.get(v.id).await.unwrap().unwrap().status,
        VehicleStatus::Assigned
    );

    services.assignments.complete(a.id).await.unwrap();
    assert!(matches!(
        services.assignments.complete(a.id).await,
        Err(AppError::Conflict(_))
    ));
    assert!(services.clients.get(c.id).await.unwrap().unwrap().available);

    let history = services.clients.assignment_history(c.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].assignment.end_date.is_some());

    services.vehicles.delete(v.id, true).await.unwrap();
    services.clients.delete(c.id, false).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_assignments_have_one_winner() {
    let (services, _) = services().await;
    let v = vehicle(&services).await;
    let mut clients = Vec::new();
    for _ in 0..6 {
        clients.push(client(&services).await);
    }

    let handles: Vec<_> = clients
        .iter()
        .map(|c| {
            let services = services.clone();
            let request = CreateAssignment {
                vehicle_id: v.id,
                client_id: c.id,
                notes: None,
            };
            tokio::spawn(async move { services.assignments.create(request).await })
        })
        .collect();

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(won, 1);

    let available = count_available(&services, &clients).await;
    assert_eq!(available, clients.len() - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_assignments_for_one_client_have_one_winner() {
    let (services, _) = services().await;
    let c = client(&services).await;
    let mut vehicles = Vec::new();
    for _ in 0..6 {
        vehicles.push(vehicle(&services).await);
    }

    let handles: Vec<_> = vehicles
        .iter()
        .map(|v| {
            let services = services.clone();
            let request = CreateAssignment {
                vehicle_id: v.id,
                client_id: c.id,
                notes: None,
            };
            tokio::spawn(async move { services.assignments.create(request).await })
        })
        .collect();

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(won, 1);

    assert!(!services.clients.get(c.id).await.unwrap().unwrap().available);
    assert_eq!(count_assigned(&services, &vehicles).await, 1);
}

async fn count_assigned(services: &Services, vehicles: &[Vehicle]) -> usize {
    let mut count = 0;
    for v in vehicles {
        if services.vehicles.get(v.id).await.unwrap().unwrap().status == VehicleStatus::Assigned {
            count += 1;
        }
    }
    count
}

async fn count_available(services: &Services, clients: &[Client]) -> usize {
    let mut count = 0;
    for c in clients {
        if services.clients.get(c.id).await.unwrap().unwrap().available {
            count += 1;
        }
    }
    count
}
