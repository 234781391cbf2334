//! Contact detection and resolution.
//!
//! Detection collects [`Contact`]s for the current solver iteration;
//! resolution then pushes each contact's particle out along its separating
//! normal:
//!
//! ```text
//! push   = max(offset - p · n, 0) · blend
//! push'  = push - depth        (kept only while positive, else push)
//! p     += n · push' · (1 - fixed) · (1 - dummy)
//! ```

use nalgebra::Vector3;

use crate::collider::{BodyCollider, PlaneCollider};
use crate::collision::{
    Sphere, SeparatingPlane, edge_capsule, edge_sphere, plane_sphere, sphere_capsule, sphere_sphere,
};
use crate::constraints::DistanceConstraint;
use crate::particles::{ParticleWeights, Particles};

/// A particle touching a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Particle index.
    pub index: usize,
    /// Unit separating direction.
    pub normal: Vector3<f64>,
    /// Plane constant the particle is pushed to along `normal`.
    pub offset: f64,
}

impl Contact {
    fn new(index: usize, plane: SeparatingPlane) -> Self {
        Self {
            index,
            normal: plane.normal,
            offset: plane.offset,
        }
    }
}

/// How hard contacts push.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResponse {
    /// Fraction of the penetration corrected per resolution.
    pub blend: f64,
    /// Penetration left uncorrected.
    pub penetration_depth: f64,
}

/// Contacts between particle spheres and body colliders.
pub fn detect_body_contacts(particles: &Particles, body: &BodyCollider, out: &mut Vec<Contact>) {
    let current = body.current();
    let previous = body.previous();
    for i in 0..particles.len() {
        if particles.is_dummy(i) {
            continue;
        }
        let radius = particles.sphere_radius[i];
        let sphere = Sphere::new(particles.positions[i], radius);
        let prev_sphere = Sphere::new(particles.prev_positions[i], radius);

        for (collider, prev) in current.spheres.iter().zip(&previous.spheres) {
            if let (Some(collider), Some(prev)) = (collider, prev) {
                if let Some(plane) = sphere_sphere(&sphere, &prev_sphere, collider, prev) {
                    out.push(Contact::new(i, plane));
                }
            }
        }
        for (collider, prev) in current.capsules.iter().zip(&previous.capsules) {
            if let (Some(collider), Some(prev)) = (collider, prev) {
                if let Some(plane) = sphere_capsule(&sphere, &prev_sphere, collider, prev) {
                    out.push(Contact::new(i, plane));
                }
            }
        }
    }
}

/// Contacts between structural edges and body colliders.
///
/// Both ends of a touching edge get a contact with the same plane. Edges with
/// a padding end are skipped.
pub fn detect_edge_contacts(
    particles: &Particles,
    edges: &[DistanceConstraint],
    body: &BodyCollider,
    out: &mut Vec<Contact>,
) {
    let current = body.current();
    for edge in edges {
        let (a, b) = (edge.first, edge.second);
        if particles.is_dummy(a) || particles.is_dummy(b) {
            continue;
        }
        let start = particles.positions[a];
        let end = particles.positions[b];

        let spheres = current
            .spheres
            .iter()
            .flatten()
            .filter_map(|s| edge_sphere(&start, &end, s));
        let capsules = current
            .capsules
            .iter()
            .flatten()
            .filter_map(|c| edge_capsule(&start, &end, c));
        for plane in spheres.chain(capsules) {
            out.push(Contact::new(a, plane));
            out.push(Contact::new(b, plane));
        }
    }
}

/// Contacts between particle spheres and planes.
pub fn detect_plane_contacts(
    particles: &Particles,
    planes: &[PlaneCollider],
    out: &mut Vec<Contact>,
) {
    for plane in planes.iter().filter_map(PlaneCollider::current) {
        for i in 0..particles.len() {
            if particles.is_dummy(i) {
                continue;
            }
            let sphere = Sphere::new(particles.positions[i], particles.sphere_radius[i]);
            if let Some(hit) = plane_sphere(&plane.origin, &plane.normal, &sphere) {
                out.push(Contact::new(i, hit));
            }
        }
    }
}

/// Push every contact's particle out of its collider.
pub fn resolve_contacts(
    contacts: &[Contact],
    positions: &mut [Vector3<f64>],
    weights: &ParticleWeights<'_>,
    response: ContactResponse,
) {
    for contact in contacts {
        let i = contact.index;
        let push = (contact.offset - positions[i].dot(&contact.normal)).max(0.0) * response.blend;
        let reduced = push - response.penetration_depth;
        let push = if reduced > 0.0 { reduced } else { push };
        positions[i] +=
            contact.normal * (push * (1.0 - weights.fixed_blend[i]) * (1.0 - weights.dummy_mask[i]));
    }
}

/// Friction for the next frame: configured friction where a contact was
/// found, zero elsewhere.
pub fn update_friction(particles: &mut Particles, contacts: &[Contact]) {
    particles.friction.fill(0.0);
    for contact in contacts {
        particles.friction[contact.index] = particles.base_friction[contact.index];
    }
}
