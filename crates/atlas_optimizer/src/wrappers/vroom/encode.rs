use fxhash::FxHashMap;

use crate::{
    problem::{
        matrix::MatrixDimension,
        point::Point,
        service::{Activity, Quantity},
        time_window::TimeWindow,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    wrappers::error::SolveError,
};

use super::types::{
    OPEN_END, VroomBreak, VroomJob, VroomProblem, VroomShipment, VroomShipmentStep, VroomVehicle,
};

/// What the decoder needs to map vroom identifiers back to the problem.
#[derive(Debug, Default, PartialEq)]
pub struct VroomEncoded {
    /// Vehicle index and rest id behind each break id.
    pub rests: Vec<(usize, String)>,
    /// Units of the capacity dimensions, in order.
    pub units: Vec<String>,
}

fn time_windows(time_windows: &[TimeWindow]) -> Vec<[i64; 2]> {
    time_windows
        .iter()
        .map(|time_window| {
            [
                time_window.start_secs().unwrap_or(0),
                time_window.end_secs().unwrap_or(OPEN_END),
            ]
        })
        .collect()
}

/// Vroom priorities grow from 0 to 100 with importance, ours from 8 to 0.
fn priority(priority: u32) -> u32 {
    100 * (8 - priority.min(8)) / 8
}

struct Encoder<'a> {
    problem: &'a VehicleRoutingProblem,
    points: FxHashMap<&'a str, &'a Point>,
    /// Vehicle skills then sticky vehicle ids.
    skills: Vec<&'a str>,
    units: Vec<&'a str>,
}

impl<'a> Encoder<'a> {
    fn new(problem: &'a VehicleRoutingProblem) -> Self {
        let mut skills: Vec<&str> = Vec::new();
        let vehicle_skills = problem
            .vehicles()
            .iter()
            .flat_map(|vehicle| vehicle.skills().iter());
        let sticky_ids = problem
            .services()
            .iter()
            .flat_map(|service| service.sticky_vehicle_ids().iter());
        for skill in vehicle_skills.chain(sticky_ids) {
            if !skills.contains(&skill.as_str()) {
                skills.push(skill);
            }
        }

        let units = problem
            .units()
            .iter()
            .filter(|unit| {
                problem
                    .vehicles()
                    .iter()
                    .filter_map(|vehicle| vehicle.capacity(unit.id()))
                    .any(|limit| limit > 0.0)
            })
            .map(|unit| unit.id())
            .collect();

        Encoder {
            problem,
            points: problem.points_by_id(),
            skills,
            units,
        }
    }

    fn skill_indices<'s>(&self, names: impl IntoIterator<Item = &'s String>) -> Vec<usize> {
        names
            .into_iter()
            .filter_map(|name| self.skills.iter().position(|skill| *skill == name.as_str()))
            .collect()
    }

    fn matrix_index(&self, point_id: &str) -> Result<usize, SolveError> {
        self.points
            .get(point_id)
            .and_then(|point| point.matrix_index())
            .ok_or_else(|| SolveError::Encode(format!("point {point_id} has no matrix index")))
    }

    /// Positive and negative parts of the quantities, one cell per unit.
    fn amounts(&self, quantities: &[Quantity]) -> (Vec<i64>, Vec<i64>) {
        let total = |unit_id: &str| -> f64 {
            quantities
                .iter()
                .filter(|quantity| quantity.unit_id() == unit_id)
                .map(|quantity| quantity.value())
                .sum()
        };

        self.units
            .iter()
            .map(|unit_id| {
                let value = total(*unit_id);
                (value.max(0.0).round() as i64, (-value).max(0.0).round() as i64)
            })
            .unzip()
    }

    fn vehicles(&self, rests: &mut Vec<(usize, String)>) -> Result<Vec<VroomVehicle>, SolveError> {
        self.problem
            .vehicles()
            .iter()
            .enumerate()
            .map(|(index, vehicle)| {
                let time_window = [
                    vehicle
                        .timewindow()
                        .and_then(|timewindow| timewindow.start_secs())
                        .unwrap_or(0),
                    vehicle
                        .timewindow()
                        .and_then(|timewindow| timewindow.end_secs())
                        .unwrap_or(OPEN_END),
                ];

                let mut skills: Vec<usize> = self
                    .skills
                    .iter()
                    .position(|skill| *skill == vehicle.id())
                    .into_iter()
                    .collect();
                skills.extend(self.skill_indices(vehicle.skills()));

                let breaks = vehicle
                    .rests()
                    .iter()
                    .map(|rest| {
                        rests.push((index, rest.id().to_owned()));
                        VroomBreak {
                            id: rests.len() - 1,
                            service: rest.duration().as_secs(),
                            time_windows: time_windows(rest.timewindows()),
                        }
                    })
                    .collect();

                Ok(VroomVehicle {
                    id: index,
                    start_index: vehicle
                        .start_point_id()
                        .map(|point_id| self.matrix_index(point_id))
                        .transpose()?,
                    end_index: vehicle
                        .end_point_id()
                        .map(|point_id| self.matrix_index(point_id))
                        .transpose()?,
                    capacity: self
                        .units
                        .iter()
                        .map(|unit_id| vehicle.capacity(unit_id).map_or(0, |limit| limit as i64))
                        .collect(),
                    time_window: (time_window != [0, OPEN_END]).then_some(time_window),
                    skills,
                    breaks,
                })
            })
            .collect()
    }

    fn jobs(&self) -> Result<Vec<VroomJob>, SolveError> {
        self.problem
            .services()
            .iter()
            .enumerate()
            .map(|(index, service)| {
                let activity = service.first_activity().ok_or_else(|| {
                    SolveError::Encode(format!("service {} has no activity", service.id()))
                })?;
                let (pickup, delivery) = self.amounts(service.quantities());
                let mut skills = self.skill_indices(service.skills());
                skills.extend(self.skill_indices(service.sticky_vehicle_ids()));

                Ok(VroomJob {
                    id: index,
                    location_index: self.matrix_index(activity.point_id())?,
                    service: activity.duration().as_secs(),
                    skills,
                    priority: priority(service.priority()),
                    time_windows: time_windows(activity.timewindows()),
                    pickup,
                    delivery,
                })
            })
            .collect()
    }

    fn shipment_step(&self, id: usize, activity: &Activity) -> Result<VroomShipmentStep, SolveError> {
        Ok(VroomShipmentStep {
            id,
            service: activity.duration().as_secs(),
            location_index: self.matrix_index(activity.point_id())?,
            time_windows: time_windows(activity.timewindows()),
        })
    }

    fn shipments(&self) -> Result<Vec<VroomShipment>, SolveError> {
        let offset = self.problem.services().len();
        self.problem
            .shipments()
            .iter()
            .enumerate()
            .map(|(index, shipment)| {
                let (amount, _) = self.amounts(shipment.quantities());
                Ok(VroomShipment {
                    amount,
                    skills: self.skill_indices(shipment.skills()),
                    priority: priority(shipment.priority()),
                    pickup: self.shipment_step(offset + 2 * index, shipment.pickup())?,
                    delivery: self.shipment_step(offset + 2 * index + 1, shipment.delivery())?,
                })
            })
            .collect()
    }

    /// Rounded cost matrix between the given locations, blending every
    /// dimension the first vehicle pays for.
    fn blended_matrix(&self, locations: &[usize], auxiliary_node: bool) -> Vec<Vec<i64>> {
        let Some(vehicle) = self.problem.vehicles().first() else {
            return Vec::new();
        };
        let Some(matrix) = self.problem.vehicle_matrix(vehicle) else {
            return Vec::new();
        };

        let dimensions: Vec<MatrixDimension> = [
            (MatrixDimension::Time, vehicle.cost_time_multiplier()),
            (MatrixDimension::Distance, vehicle.cost_distance_multiplier()),
            (MatrixDimension::Value, vehicle.cost_value_multiplier()),
        ]
        .into_iter()
        .filter(|(_, multiplier)| *multiplier > 0.0)
        .map(|(dimension, _)| dimension)
        .collect();

        let size = locations.len() + usize::from(auxiliary_node);
        let mut rows = vec![vec![0; size]; size];
        for (i, &from) in locations.iter().enumerate() {
            for (j, &to) in locations.iter().enumerate() {
                let cost: f64 = dimensions
                    .iter()
                    .filter_map(|dimension| matrix.get(*dimension, from, to))
                    .sum();
                rows[i][j] = cost.round() as i64;
            }
        }
        rows
    }
}

/// Builds the vroom document, with locations renumbered to the matrix indices
/// actually used.
pub fn encode_problem(
    problem: &VehicleRoutingProblem,
) -> Result<(VroomProblem, VroomEncoded), SolveError> {
    let encoder = Encoder::new(problem);
    let mut rests = Vec::new();
    let mut vehicles = encoder.vehicles(&mut rests)?;
    let mut jobs = encoder.jobs()?;
    let mut shipments = encoder.shipments()?;

    let mut locations: Vec<usize> = jobs.iter().map(|job| job.location_index).collect();
    for shipment in &shipments {
        locations.push(shipment.pickup.location_index);
        locations.push(shipment.delivery.location_index);
    }
    for vehicle in &vehicles {
        locations.extend(vehicle.start_index);
        locations.extend(vehicle.end_index);
    }
    locations.sort_unstable();
    locations.dedup();

    let relabel = |index: usize| locations.binary_search(&index).unwrap_or_default();
    for job in &mut jobs {
        job.location_index = relabel(job.location_index);
    }
    for shipment in &mut shipments {
        shipment.pickup.location_index = relabel(shipment.pickup.location_index);
        shipment.delivery.location_index = relabel(shipment.delivery.location_index);
    }

    let mut auxiliary_node = false;
    for vehicle in &mut vehicles {
        vehicle.start_index = vehicle.start_index.map(relabel);
        vehicle.end_index = vehicle.end_index.map(relabel);
        if vehicle.start_index.is_none() && vehicle.end_index.is_none() {
            vehicle.start_index = Some(locations.len());
            auxiliary_node = true;
        }
    }

    let matrix = encoder.blended_matrix(&locations, auxiliary_node);
    let encoded = VroomEncoded {
        rests,
        units: encoder.units.iter().map(|unit| unit.to_string()).collect(),
    };

    Ok((
        VroomProblem {
            vehicles,
            jobs,
            shipments,
            matrix,
        },
        encoded,
    ))
}
