//! Velocity-Verlet force simulation over table centers.
//!
//! Mirrors the classic d3-force pipeline: each tick cools `alpha`, lets every
//! force adjust velocities (centering adjusts positions), then integrates
//! with velocity decay. Many-body repulsion is computed exactly over all
//! pairs rather than with a Barnes-Hut tree.

use super::LayoutConfig;

#[derive(Debug, Clone)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub h: f64,
}

impl Body {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            w,
            h,
        }
    }
}

/// Spring between two body indices with its rest length.
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    pub distance: f64,
}

/// Linear congruential generator used for the tiny jiggle that separates
/// coincident bodies; fixed seed so layouts are reproducible.
struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    fn next(&mut self) -> f64 {
        self.0 = (Self::A.wrapping_mul(self.0).wrapping_add(Self::C)) % Self::M;
        self.0 as f64 / Self::M as f64
    }

    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

pub struct Simulation<'c> {
    config: &'c LayoutConfig,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    /// Share of each spring's correction applied to the target.
    bias: Vec<f64>,
    radii: Vec<f64>,
    alpha: f64,
    alpha_decay: f64,
    random: Lcg,
}

impl<'c> Simulation<'c> {
    pub fn new(config: &'c LayoutConfig, bodies: Vec<Body>, springs: Vec<Spring>) -> Self {
        let mut degree = vec![0usize; bodies.len()];
        for s in &springs {
            degree[s.source] += 1;
            degree[s.target] += 1;
        }
        let bias = springs
            .iter()
            .map(|s| {
                let (a, b) = (degree[s.source] as f64, degree[s.target] as f64);
                a / (a + b)
            })
            .collect();
        let radii = bodies
            .iter()
            .map(|b| b.w.hypot(b.h) / 2.0 + config.collide_padding)
            .collect();
        Self {
            config,
            bodies,
            springs,
            bias,
            radii,
            alpha: 1.0,
            alpha_decay: 1.0 - config.alpha_min.powf(1.0 / config.alpha_decay_ticks),
            random: Lcg(1),
        }
    }

    /// Number of ticks for `n` bodies: `ceil(min(1200, 30 * sqrt(n)))`.
    pub fn tick_count(config: &LayoutConfig, n: usize) -> usize {
        (config.ticks_per_sqrt_node * (n as f64).sqrt())
            .min(config.max_ticks as f64)
            .ceil() as usize
    }

    pub fn run(mut self, ticks: usize) -> Vec<Body> {
        for _ in 0..ticks {
            self.tick();
        }
        self.bodies
    }

    pub fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_charge(alpha);
        self.apply_springs(alpha);
        for _ in 0..self.config.collide_iterations {
            self.apply_collision();
        }
        self.apply_pull(alpha);
        self.apply_centering();

        let keep = 1.0 - self.config.velocity_decay;
        for b in &mut self.bodies {
            b.vx *= keep;
            b.x += b.vx;
            b.vy *= keep;
            b.y += b.vy;
        }
    }

    fn apply_charge(&mut self, alpha: f64) {
        let n = self.bodies.len();
        let strength = self.config.charge_strength;
        for i in 0..n {
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.bodies[j].x - self.bodies[i].x;
                let mut y = self.bodies[j].y - self.bodies[i].y;
                let mut l = x * x + y * y;
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                if l < 1.0 {
                    l = l.sqrt();
                }
                let w = strength * alpha / l;
                dvx += x * w;
                dvy += y * w;
            }
            self.bodies[i].vx += dvx;
            self.bodies[i].vy += dvy;
        }
    }

    fn apply_springs(&mut self, alpha: f64) {
        let strength = self.config.link_strength;
        for (k, s) in self.springs.iter().enumerate() {
            if s.source == s.target {
                continue;
            }
            let (src, tgt) = (&self.bodies[s.source], &self.bodies[s.target]);
            let mut x = tgt.x + tgt.vx - src.x - src.vx;
            let mut y = tgt.y + tgt.vy - src.y - src.vy;
            if x == 0.0 {
                x = self.random.jiggle();
            }
            if y == 0.0 {
                y = self.random.jiggle();
            }
            let l = (x * x + y * y).sqrt();
            let f = (l - s.distance) / l * alpha * strength;
            x *= f;
            y *= f;

            let b = self.bias[k];
            let tgt = &mut self.bodies[s.target];
            tgt.vx -= x * b;
            tgt.vy -= y * b;
            let src = &mut self.bodies[s.source];
            src.vx += x * (1.0 - b);
            src.vy += y * (1.0 - b);
        }
    }

    /// One pass of pairwise collision on predicted positions.
    fn apply_collision(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            let ri = self.radii[i];
            let ri2 = ri * ri;
            let xi = self.bodies[i].x + self.bodies[i].vx;
            let yi = self.bodies[i].y + self.bodies[i].vy;
            for j in (i + 1)..n {
                let rj = self.radii[j];
                let r = ri + rj;
                let mut x = xi - self.bodies[j].x - self.bodies[j].vx;
                let mut y = yi - self.bodies[j].y - self.bodies[j].vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.random.jiggle();
                    l += y * y;
                }
                let dist = l.sqrt();
                let push = (r - dist) / dist;
                x *= push;
                y *= push;
                let rj2 = rj * rj;
                let share = rj2 / (ri2 + rj2);
                self.bodies[i].vx += x * share;
                self.bodies[i].vy += y * share;
                self.bodies[j].vx -= x * (1.0 - share);
                self.bodies[j].vy -= y * (1.0 - share);
            }
        }
    }

    /// forceX / forceY toward the origin.
    fn apply_pull(&mut self, alpha: f64) {
        let k = self.config.pull_strength * alpha;
        for b in &mut self.bodies {
            b.vx += (0.0 - b.x) * k;
            b.vy += (0.0 - b.y) * k;
        }
    }

    /// Shift every body so the mean position sits at the origin.
    fn apply_centering(&mut self) {
        let n = self.bodies.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let (mx, my) = (sx / n as f64, sy / n as f64);
        for b in &mut self.bodies {
            b.x -= mx;
            b.y -= my;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_tick_count() {
        let c = config();
        assert_eq!(Simulation::tick_count(&c, 1), 30);
        assert_eq!(Simulation::tick_count(&c, 2), 43);
        assert_eq!(Simulation::tick_count(&c, 4), 60);
        assert_eq!(Simulation::tick_count(&c, 10_000), 1200);
    }

    #[test]
    fn test_repulsion_separates_pair() {
        let c = config();
        let bodies = vec![Body::new(-1.0, 0.0, 10.0, 10.0), Body::new(1.0, 0.0, 10.0, 10.0)];
        let out = Simulation::new(&c, bodies, Vec::new()).run(40);
        assert!(out[1].x - out[0].x > 50.0);
        // centering keeps the mean at the origin
        assert!((out[0].x + out[1].x).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_bodies_split() {
        let c = config();
        let bodies = vec![Body::new(0.0, 0.0, 10.0, 10.0), Body::new(0.0, 0.0, 10.0, 10.0)];
        let out = Simulation::new(&c, bodies, Vec::new()).run(30);
        let d = (out[0].x - out[1].x).hypot(out[0].y - out[1].y);
        assert!(d > 1.0);
        assert!(out.iter().all(|b| b.x.is_finite() && b.y.is_finite()));
    }

    #[test]
    fn test_deterministic() {
        let c = config();
        let make = || {
            let bodies = (0..5)
                .map(|i| Body::new(i as f64 * 3.0, 0.0, 100.0, 60.0))
                .collect::<Vec<_>>();
            let springs = vec![Spring {
                source: 0,
                target: 4,
                distance: 250.0,
            }];
            Simulation::new(&c, bodies, springs).run(60)
        };
        let a = make();
        let b = make();
        for (p, q) in a.iter().zip(&b) {
            assert_eq!((p.x, p.y), (q.x, q.y));
        }
    }

    #[test]
    fn test_self_spring_is_inert() {
        let c = config();
        let bodies = vec![Body::new(5.0, 5.0, 10.0, 10.0), Body::new(300.0, 0.0, 10.0, 10.0)];
        let springs = vec![Spring {
            source: 0,
            target: 0,
            distance: 200.0,
        }];
        let with = Simulation::new(&c, bodies.clone(), springs).run(10);
        let without = Simulation::new(&c, bodies, Vec::new()).run(10);
        for (p, q) in with.iter().zip(&without) {
            assert_eq!((p.x, p.y), (q.x, q.y));
        }
    }
}
