//! Read-side views joined from one [`FleetSnapshot`].
//!
//! Nothing here touches storage; callers read a snapshot first so every view
//! built from it agrees with the others.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{
        Assignment, AssignmentStatus, AssignmentWithDetails, Client, ClientWithAssignment,
        Vehicle, VehicleStatus, VehicleWithAssignment,
    },
    repository::FleetSnapshot,
};

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total_vehicles: usize,
    pub available_vehicles: usize,
    pub assigned_vehicles: usize,
    /// Maintenance and out-of-service vehicles
    pub maintenance_vehicles: usize,
    pub total_clients: usize,
    pub available_clients: usize,
    pub active_assignments: usize,
}

/// Newest start date first; ties fall back to creation time, then id
fn newest_first(a: &Assignment, b: &Assignment) -> Ordering {
    b.start_date
        .cmp(&a.start_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn index_vehicles(snapshot: &FleetSnapshot) -> HashMap<Uuid, &Vehicle> {
    snapshot.vehicles.iter().map(|v| (v.id, v)).collect()
}

fn index_clients(snapshot: &FleetSnapshot) -> HashMap<Uuid, &Client> {
    snapshot.clients.iter().map(|c| (c.id, c)).collect()
}

fn active(snapshot: &FleetSnapshot) -> impl Iterator<Item = &Assignment> {
    snapshot.assignments.iter().filter(|a| a.is_active())
}

/// Vehicles ordered by plate, each with its current assignee's name
pub fn vehicle_views(snapshot: &FleetSnapshot) -> Vec<VehicleWithAssignment> {
    let clients = index_clients(snapshot);
    let assignee: HashMap<Uuid, String> = active(snapshot)
        .filter_map(|a| clients.get(&a.client_id).map(|c| (a.vehicle_id, c.full_name())))
        .collect();

    let mut views: Vec<VehicleWithAssignment> = snapshot
        .vehicles
        .iter()
        .map(|vehicle| VehicleWithAssignment {
            assigned_to: assignee.get(&vehicle.id).cloned(),
            vehicle: vehicle.clone(),
        })
        .collect();
    views.sort_by(|a, b| a.vehicle.license_plate.cmp(&b.vehicle.license_plate));
    views
}

/// Clients ordered by name, each with a description of the vehicle it holds
pub fn client_views(snapshot: &FleetSnapshot) -> Vec<ClientWithAssignment> {
    let vehicles = index_vehicles(snapshot);
    let holding: HashMap<Uuid, String> = active(snapshot)
        .filter_map(|a| vehicles.get(&a.vehicle_id).map(|v| (a.client_id, v.description())))
        .collect();

    let mut views: Vec<ClientWithAssignment> = snapshot
        .clients
        .iter()
        .map(|client| ClientWithAssignment {
            assigned_vehicle: holding.get(&client.id).cloned(),
            client: client.clone(),
        })
        .collect();
    views.sort_by(|a, b| {
        (&a.client.last_name, &a.client.first_name, a.client.id)
            .cmp(&(&b.client.last_name, &b.client.first_name, b.client.id))
    });
    views
}

/// Assignments matching `keep`, newest first, with client and vehicle names.
///
/// Assignments whose vehicle or client is missing from the snapshot are
/// skipped, as an inner join would.
fn detailed<F>(snapshot: &FleetSnapshot, keep: F) -> Vec<AssignmentWithDetails>
where
    F: Fn(&Assignment) -> bool,
{
    let vehicles = index_vehicles(snapshot);
    let clients = index_clients(snapshot);

    let mut rows: Vec<&Assignment> = snapshot.assignments.iter().filter(|a| keep(a)).collect();
    rows.sort_by(|a, b| newest_first(a, b));

    rows.into_iter()
        .filter_map(|a| {
            let vehicle = vehicles.get(&a.vehicle_id)?;
            let client = clients.get(&a.client_id)?;
            Some(AssignmentWithDetails {
                assignment: a.clone(),
                client_name: client.full_name(),
                vehicle_plate: vehicle.license_plate.clone(),
                vehicle_model: vehicle.display_model(),
            })
        })
        .collect()
}

/// Every assignment, newest first
pub fn assignment_views(snapshot: &FleetSnapshot) -> Vec<AssignmentWithDetails> {
    detailed(snapshot, |_| true)
}

/// The client's active assignment, if any
pub fn active_assignment_for_client(
    snapshot: &FleetSnapshot,
    client_id: Uuid,
) -> Option<AssignmentWithDetails> {
    detailed(snapshot, |a| a.client_id == client_id && a.is_active())
        .into_iter()
        .next()
}

/// The client's completed assignments, newest first
pub fn assignment_history_for_client(
    snapshot: &FleetSnapshot,
    client_id: Uuid,
) -> Vec<AssignmentWithDetails> {
    detailed(snapshot, |a| {
        a.client_id == client_id && a.status == AssignmentStatus::Completed
    })
}

pub fn fleet_stats(snapshot: &FleetSnapshot) -> FleetStats {
    let count_status = |status: VehicleStatus| {
        snapshot.vehicles.iter().filter(|v| v.status == status).count()
    };
    FleetStats {
        total_vehicles: snapshot.vehicles.len(),
        available_vehicles: count_status(VehicleStatus::Available),
        assigned_vehicles: count_status(VehicleStatus::Assigned),
        maintenance_vehicles: snapshot.vehicles.iter().filter(|v| v.status.is_grounded()).count(),
        total_clients: snapshot.clients.len(),
        available_clients: snapshot.clients.iter().filter(|c| c.available).count(),
        active_assignments: active(snapshot).count(),
    }
}
