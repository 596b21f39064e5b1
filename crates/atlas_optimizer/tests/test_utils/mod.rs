use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use atlas_optimizer::{
    problem::{
        location::Location,
        matrix::Matrix,
        point::Point,
        service::{Activity, ServiceBuilder},
        unit::Unit,
        vehicle::VehicleBuilder,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    wrappers::settings::SolverSettings,
};
use jiff::SignedDuration;
use tempfile::TempDir;

pub const DEPOT: (f64, f64) = (48.85, 2.35);

/// A fake solver executable and the directory holding it.
pub struct FakeSolver {
    pub dir: TempDir,
    pub exec: PathBuf,
}

impl FakeSolver {
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let exec = dir.path().join("solver.sh");
        fs::write(&exec, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o755)).unwrap();
        FakeSolver { dir, exec }
    }

    pub fn settings(&self) -> SolverSettings {
        SolverSettings {
            ortools_exec: self.exec.clone(),
            vroom_exec: self.exec.clone(),
            tmp_dir: Some(self.dir.path().to_path_buf()),
            ..SolverSettings::default()
        }
    }

    /// Exchange files left behind in the solver directory.
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path != &self.exec)
            .collect()
    }
}

fn haversine_matrix(points: &[Point]) -> Matrix {
    let mut time = Vec::new();
    let mut distance = Vec::new();
    for from in points {
        for to in points {
            let meters = match (from.location(), to.location()) {
                (Some(a), Some(b)) => a.haversine_distance(b).round(),
                _ => 0.0,
            };
            distance.push(meters);
            time.push((meters / 10.0).round());
        }
    }

    Matrix::new("m", points.len())
        .with_time(time)
        .with_distance(distance)
}

/// One 1 kg service of 5 minutes per location, and vehicles of 10 kg based
/// at the depot.
pub fn create_problem(locations: &[(f64, f64)], vehicles: usize) -> VehicleRoutingProblem {
    let mut points = vec![Point::new(
        "depot",
        Some(Location::from_lat_lon(DEPOT.0, DEPOT.1)),
        Some(0),
    )];
    points.extend(locations.iter().enumerate().map(|(i, &(lat, lon))| {
        Point::new(
            format!("p{i}"),
            Some(Location::from_lat_lon(lat, lon)),
            Some(i + 1),
        )
    }));

    let services = (0..locations.len())
        .map(|i| {
            let mut builder = ServiceBuilder::default();
            builder
                .set_id(format!("s{i}"))
                .set_activity(
                    Activity::new(format!("p{i}")).with_duration(SignedDuration::from_mins(5)),
                )
                .add_quantity("kg", 1.0);
            builder.build()
        })
        .collect();

    let vehicles = (0..vehicles)
        .map(|i| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_id(format!("v{i}"))
                .set_start_point_id("depot")
                .set_end_point_id("depot")
                .set_matrix_id("m")
                .add_capacity("kg", 10.0);
            builder.build()
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_id("integration")
        .set_matrices(vec![haversine_matrix(&points)])
        .set_points(points)
        .set_units(vec![Unit::new("kg")])
        .set_services(services)
        .set_vehicles(vehicles);
    builder.build()
}

/// Services spread on a line north of the depot.
pub fn create_line_problem(services: usize, vehicles: usize) -> VehicleRoutingProblem {
    let locations: Vec<(f64, f64)> = (0..services)
        .map(|i| (DEPOT.0 + 0.01 * (i + 1) as f64, DEPOT.1))
        .collect();
    create_problem(&locations, vehicles)
}

pub fn is_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}
