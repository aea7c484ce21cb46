//! # Poisson-Disc Sampling
//!
//! Bridson's algorithm: points spread over a rectangle so that no two lie
//! closer than a minimum radius, found through an active list and a background
//! grid of cell size `r / sqrt(2)` (at most one point per cell).

use crate::generation::utils::GenRng;
use crate::{StrataError, StrataResult};
use rand::Rng;
use std::f64::consts::{PI, SQRT_2};

/// Candidate attempts around an active point before it is retired.
pub const DEFAULT_ATTEMPTS: u32 = 30;

/// Blue-noise point sampler over a `width` x `height` rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonDiscSampler {
    pub width: f64,
    pub height: f64,
    /// Minimum distance between any two points
    pub radius: f64,
    pub attempts: u32,
}

impl PoissonDiscSampler {
    /// Creates a sampler with the default attempt count.
    pub fn new(width: f64, height: f64, radius: f64) -> Self {
        Self {
            width,
            height,
            radius,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// Creates a sampler whose spacing follows a density in `(0, 1]`:
    /// `radius = 3 / sqrt(density)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::PoissonDiscSampler;
    ///
    /// let sampler = PoissonDiscSampler::for_density(50.0, 50.0, 1.0).unwrap();
    /// assert_eq!(sampler.radius, 3.0);
    /// assert!(PoissonDiscSampler::for_density(50.0, 50.0, 0.0).is_err());
    /// ```
    pub fn for_density(width: f64, height: f64, density: f64) -> StrataResult<Self> {
        if !(density > 0.0 && density <= 1.0) {
            return Err(StrataError::InvalidConfig(format!(
                "tree density must be within (0, 1], got {density}"
            )));
        }
        Ok(Self::new(width, height, 3.0 / density.sqrt()))
    }

    /// Draws the point set.
    pub fn sample(&self, rng: &mut GenRng) -> Vec<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 || self.radius <= 0.0 {
            return Vec::new();
        }
        let cell = self.radius / SQRT_2;
        let cols = (self.width / cell).ceil() as usize;
        let rows = (self.height / cell).ceil() as usize;
        let mut background: Vec<Option<usize>> = vec![None; cols * rows];
        let cell_of = |(x, y): (f64, f64)| {
            (
                ((x / cell) as usize).min(cols - 1),
                ((y / cell) as usize).min(rows - 1),
            )
        };

        let first = (rng.gen_range(0.0..self.width), rng.gen_range(0.0..self.height));
        let mut points = vec![first];
        let mut active = vec![0usize];
        let (col, row) = cell_of(first);
        background[row * cols + col] = Some(0);

        while !active.is_empty() {
            let slot = rng.gen_range(0..active.len());
            let (px, py) = points[active[slot]];
            let mut placed = false;

            for _ in 0..self.attempts {
                let angle = rng.gen_range(0.0..2.0 * PI);
                let distance = rng.gen_range(self.radius..2.0 * self.radius);
                let candidate = (px + distance * angle.cos(), py + distance * angle.sin());
                if candidate.0 < 0.0 || candidate.1 < 0.0 || candidate.0 >= self.width || candidate.1 >= self.height {
                    continue;
                }

                let (col, row) = cell_of(candidate);
                let too_close = (row.saturating_sub(2)..(row + 3).min(rows)).any(|r| {
                    (col.saturating_sub(2)..(col + 3).min(cols)).any(|c| {
                        background[r * cols + c].is_some_and(|index| {
                            let (qx, qy) = points[index];
                            (qx - candidate.0).powi(2) + (qy - candidate.1).powi(2) < self.radius * self.radius
                        })
                    })
                });
                if too_close {
                    continue;
                }

                background[row * cols + col] = Some(points.len());
                active.push(points.len());
                points.push(candidate);
                placed = true;
                break;
            }

            if !placed {
                active.swap_remove(slot);
            }
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_points_respect_minimum_distance() {
        let sampler = PoissonDiscSampler::new(60.0, 40.0, 4.0);
        let points = sampler.sample(&mut create_rng(9));
        assert!(points.len() > 20);
        for (i, a) in points.iter().enumerate() {
            assert!(a.0 >= 0.0 && a.0 < 60.0 && a.1 >= 0.0 && a.1 < 40.0);
            for b in &points[i + 1..] {
                let distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                assert!(distance >= 4.0 - 1e-9);
            }
        }
    }

    #[test]
    fn test_denser_sampling_places_more_points() {
        let mut rng = create_rng(1);
        let sparse = PoissonDiscSampler::for_density(80.0, 80.0, 0.1).unwrap().sample(&mut rng);
        let dense = PoissonDiscSampler::for_density(80.0, 80.0, 0.9).unwrap().sample(&mut rng);
        assert!(dense.len() > sparse.len());
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let sampler = PoissonDiscSampler::new(30.0, 30.0, 3.0);
        assert_eq!(sampler.sample(&mut create_rng(4)), sampler.sample(&mut create_rng(4)));
    }

    #[test]
    fn test_degenerate_area() {
        let sampler = PoissonDiscSampler::new(0.0, 10.0, 3.0);
        assert!(sampler.sample(&mut create_rng(1)).is_empty());
        assert!(PoissonDiscSampler::for_density(10.0, 10.0, 1.5).is_err());
    }
}
