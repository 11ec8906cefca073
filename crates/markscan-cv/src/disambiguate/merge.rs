//! Proximity merge of point detections around seed candidates.

use markscan_core::geometry::mean_point;
use markscan_core::{Candidate, Point};

/// Groups point indices into seed clusters.
///
/// Points are visited in order. Each point not yet taken seeds a new cluster
/// and absorbs every later free point strictly closer than `radius` to the
/// seed. Membership is not transitive: a point near a member but far from the
/// seed starts its own cluster.
pub fn seed_clusters(points: &[Point], radius: f64) -> Vec<Vec<usize>> {
    let mut taken = vec![false; points.len()];
    let mut clusters = Vec::new();

    for i in 0..points.len() {
        if taken[i] {
            continue;
        }
        taken[i] = true;
        let mut members = vec![i];

        for j in (i + 1)..points.len() {
            if !taken[j] && points[i].distance(&points[j]) < radius {
                taken[j] = true;
                members.push(j);
            }
        }
        clusters.push(members);
    }

    clusters
}

/// Candidates gathered around one seed
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<Candidate>,
}

impl Cluster {
    pub fn new(seed: Candidate) -> Self {
        Self { members: vec![seed] }
    }

    pub fn absorb(&mut self, candidate: Candidate) {
        self.members.push(candidate);
    }

    pub fn seed(&self) -> &Candidate {
        &self.members[0]
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean member centroid, rounded to the nearest pixel
    pub fn center(&self) -> Point {
        let centroids: Vec<Point> = self.members.iter().map(|c| c.centroid).collect();
        mean_point(&centroids).map_or(self.seed().centroid, |p| p.round())
    }

    /// Mean equivalent radius of the members
    pub fn mean_radius(&self) -> f64 {
        let total: f64 = self.members.iter().map(Candidate::equivalent_radius).sum();
        total / self.members.len().max(1) as f64
    }

    /// The seed's attributes placed at the cluster centre
    pub fn collapse(self) -> Candidate {
        let center = self.center();
        self.seed().moved_to(center)
    }
}

/// Collapses near-duplicate candidates, one output per seed cluster, in
/// seed order.
pub fn merge(candidates: &[Candidate], radius: f64) -> Vec<Candidate> {
    let points: Vec<Point> = candidates.iter().map(|c| c.centroid).collect();

    seed_clusters(&points, radius)
        .into_iter()
        .map(|indices| {
            let mut cluster = Cluster::new(candidates[indices[0]].clone());
            for &i in &indices[1..] {
                cluster.absorb(candidates[i].clone());
            }
            cluster.collapse()
        })
        .collect()
}
