//! A small simulation that drives the ECS the way a game loop would.

use anyhow::{Context, Result};
use glam::Vec2;
use nomad_ecs::{EcsResult, Signature, System, SystemContext, World};
use tracing::{debug, info};

use crate::settings::Settings;

/// Where an entity is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

/// How fast an entity moves, in units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

/// Integrates velocity into position.
pub struct MovementSystem;

impl System for MovementSystem {
    fn signature(&self) -> Signature {
        Signature::new().with::<Position>().with::<Velocity>()
    }

    fn name(&self) -> &str {
        "movement"
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, delta: f32) -> EcsResult<()> {
        for &entity in ctx.entities() {
            let velocity = ctx.unpack::<Velocity>(entity)?.0;
            ctx.unpack_mut::<Position>(entity)?.0 += velocity * delta;
        }
        Ok(())
    }
}

/// Logs where positioned entities are on each render pass.
#[derive(Default)]
pub struct ReportSystem {
    frames: u64,
}

impl System for ReportSystem {
    fn signature(&self) -> Signature {
        Signature::new().with::<Position>()
    }

    fn name(&self) -> &str {
        "report"
    }

    fn init(&mut self, ctx: &mut SystemContext<'_>) -> EcsResult<()> {
        info!(watched = ctx.entities().len(), "report system ready");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut SystemContext<'_>, _delta: f32) -> EcsResult<()> {
        Ok(())
    }

    fn render(&mut self, ctx: &mut SystemContext<'_>) -> EcsResult<()> {
        self.frames += 1;
        if let Some(positions) = ctx.components::<Position>() {
            debug!(
                frame = self.frames,
                watched = ctx.entities().len(),
                centroid = %centroid(positions.as_slice()),
                "frame"
            );
        }
        Ok(())
    }
}

fn centroid(positions: &[Position]) -> Vec2 {
    if positions.is_empty() {
        return Vec2::ZERO;
    }
    positions.iter().map(|p| p.0).sum::<Vec2>() / positions.len() as f32
}

/// Outcome of a demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSummary {
    pub ticks: u32,
    pub alive: usize,
    pub moving: usize,
    pub positioned: usize,
    pub centroid: Vec2,
}

/// Spawn the configured entities, run the loop and report what is left.
///
/// Every third entity is stationary. Halfway through, the first entity stops moving and
/// the last one is destroyed.
pub fn run(settings: &Settings) -> Result<DemoSummary> {
    let mut world =
        World::with_config(settings.ecs.clone()).context("Invalid ECS configuration")?;
    world.register_component::<Position>()?;
    world.register_component::<Velocity>()?;
    let movement = world.add_system(MovementSystem)?;
    let report = world.add_system(ReportSystem::default())?;

    let mut spawned = Vec::with_capacity(settings.demo.entities);
    for i in 0..settings.demo.entities {
        let entity = world.create_entity()?;
        world.add_component(entity, Position(Vec2::new(i as f32, 0.0)))?;
        if i % 3 != 2 {
            world.add_component(entity, Velocity(Vec2::new(1.0, 0.5)))?;
        }
        spawned.push(entity);
    }
    info!(entities = spawned.len(), "spawned entities");

    world.initialize()?;
    let halfway = settings.demo.ticks / 2;
    for tick in 0..settings.demo.ticks {
        if tick == halfway {
            if let Some(&first) = spawned.first() {
                if world.has_component::<Velocity>(first) {
                    world.remove_component::<Velocity>(first)?;
                }
            }
            if let Some(last) = spawned.pop() {
                world.destroy_entity(last)?;
            }
            info!(tick, "halfway through, stopped one entity and destroyed another");
        }
        world.update(settings.demo.delta)?;
        world.render()?;
    }

    let positions = world
        .storage::<Position>()
        .map(|storage| storage.as_slice())
        .unwrap_or_default();
    Ok(DemoSummary {
        ticks: settings.demo.ticks,
        alive: world.entity_count(),
        moving: world.watched(movement).map_or(0, <[_]>::len),
        positioned: world.watched(report).map_or(0, <[_]>::len),
        centroid: centroid(positions),
    })
}
