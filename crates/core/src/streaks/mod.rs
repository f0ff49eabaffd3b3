use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    camera::Viewport,
    config::StreakConfig,
    random::SceneRng,
    render::LayerDrawStats,
    surface::{BlendMode, CircleFill, Color, ColorStop, Paint, Point, Surface},
    Result,
};

/// How far outside the viewport edge streaks are born.
const EDGE_OFFSET: f32 = 50.0;

/// Fixed-capacity FIFO of recent head positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    samples: VecDeque<Point>,
    capacity: usize,
}

impl Trail {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Appends `point`, returning the oldest sample if it had to be evicted.
    pub fn push(&mut self, point: Point) -> Option<Point> {
        self.samples.push_back(point);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.samples.iter()
    }
}

/// Shooting star travelling in screen space along a fixed angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
    pub angle: f32,
    pub opacity: f32,
    pub fade_speed: f32,
    pub hue: f32,
    pub trail: Trail,
}

impl Streak {
    /// Spawns a streak just outside a random viewport edge, aimed at a point
    /// jittered around the screen centre.
    pub fn spawn(viewport: &Viewport, rng: &mut SceneRng) -> Self {
        let (x, y) = if rng.unit() > 0.5 {
            let x = if rng.unit() > 0.5 {
                -EDGE_OFFSET
            } else {
                viewport.width + EDGE_OFFSET
            };
            (x, rng.unit() * viewport.height)
        } else {
            let y = if rng.unit() > 0.5 {
                -EDGE_OFFSET
            } else {
                viewport.height + EDGE_OFFSET
            };
            (rng.unit() * viewport.width, y)
        };

        let target_x = viewport.width * 0.5 + rng.centered(viewport.width * 0.5);
        let target_y = viewport.height * 0.5 + rng.centered(viewport.height * 0.5);
        let angle = (target_y - y).atan2(target_x - x);
        let size = rng.range(0.5, 2.0);
        let speed = rng.range(3.0, 5.0);
        let length = rng.range(150.0, 300.0).floor() as usize;

        Self {
            x,
            y,
            size,
            speed,
            angle,
            opacity: 1.0,
            fade_speed: rng.range(0.002, 0.007),
            hue: rng.range(200.0, 240.0),
            trail: Trail::with_capacity(length),
        }
    }

    pub fn update(&mut self) {
        self.x += self.angle.cos() * self.speed;
        self.y += self.angle.sin() * self.speed;
        self.opacity -= self.fade_speed;
        self.trail.push(Point::new(self.x, self.y));
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn head(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn draw(&self, surface: &mut dyn Surface) -> Result<()> {
        let samples: Vec<&Point> = self.trail.iter().collect();
        let count = samples.len() as f32;
        for (i, pair) in samples.windows(2).enumerate() {
            let progress = (i + 1) as f32 / count;
            let alpha = progress * self.opacity * 0.7;
            surface.stroke_line(
                *pair[0],
                *pair[1],
                self.size * 0.7 * progress,
                Color::hsla(self.hue, 1.0, 0.85, alpha),
            )?;
        }

        let head = self.head();
        let glow_radius = self.size * 3.0;
        surface.fill_circle(&CircleFill {
            center: head,
            radius: glow_radius,
            paint: Paint::RadialGradient {
                center: head,
                inner_radius: 0.0,
                outer_radius: glow_radius,
                stops: vec![
                    ColorStop::new(0.0, Color::hsla(self.hue, 1.0, 1.0, self.opacity)),
                    ColorStop::new(0.5, Color::hsla(self.hue, 1.0, 0.8, self.opacity * 0.7)),
                    ColorStop::new(1.0, Color::hsla(self.hue, 1.0, 0.6, 0.0)),
                ],
            },
            blend: BlendMode::SourceOver,
        })?;
        surface.fill_circle(&CircleFill {
            center: head,
            radius: self.size * 0.7,
            paint: Paint::Solid(Color::WHITE.with_alpha(self.opacity * 0.9)),
            blend: BlendMode::SourceOver,
        })
    }
}

/// Variable-size pool of live streaks.
#[derive(Debug, Clone)]
pub struct StreakStore {
    streaks: Vec<Streak>,
    spawn_chance: f32,
    hard_cap: Option<usize>,
}

impl StreakStore {
    pub fn new(config: &StreakConfig) -> Self {
        Self {
            streaks: Vec::new(),
            spawn_chance: config.spawn_chance,
            hard_cap: config.hard_cap,
        }
    }

    pub fn streaks(&self) -> &[Streak] {
        &self.streaks
    }

    pub fn len(&self) -> usize {
        self.streaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }

    pub fn push(&mut self, streak: Streak) {
        self.streaks.push(streak);
    }

    fn at_cap(&self) -> bool {
        self.hard_cap
            .map(|cap| self.streaks.len() >= cap)
            .unwrap_or(false)
    }

    /// Rolls for a spawn, advances every streak and drops the ones that faded
    /// out this tick. Returns how many were dropped.
    pub fn update(&mut self, viewport: &Viewport, rng: &mut SceneRng) -> usize {
        if rng.chance(self.spawn_chance) && !self.at_cap() {
            let streak = Streak::spawn(viewport, rng);
            tracing::trace!(x = streak.x, y = streak.y, "streak spawned");
            self.streaks.push(streak);
        }

        for streak in &mut self.streaks {
            streak.update();
        }

        let before = self.streaks.len();
        self.streaks.retain(Streak::is_alive);
        before - self.streaks.len()
    }

    /// Draws every live streak. A streak the surface rejects is logged and
    /// skipped.
    pub fn draw(&self, surface: &mut dyn Surface) -> LayerDrawStats {
        let mut stats = LayerDrawStats::default();
        for streak in &self.streaks {
            match streak.draw(surface) {
                Ok(()) => stats.drawn += 1,
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(
                        error = %err,
                        x = streak.x,
                        y = streak.y,
                        "skipping streak this frame"
                    );
                }
            }
        }
        stats
    }
}
