// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Basic example demonstrating the ECS structure
//!
//! This example shows how to create a world, spawn entities with
//! components, and drive simulation systems through the scheduler with
//! deferred structural changes.

use sim_engine::ecs::{CommandBuffer, Component, Scheduler, System, World, WorldCell};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

impl Component for Velocity {}

#[derive(Debug, Clone, Copy)]
struct Lifetime {
    seconds_left: f32,
}

impl Component for Lifetime {}

// Applies velocity to position over the frame's elapsed time.
struct MovementSystem;

impl System for MovementSystem {
    fn run(&mut self, world: WorldCell<'_>, _commands: &mut CommandBuffer, dt: f32) {
        let velocities = match world.storage::<Velocity>() {
            Some(storage) => storage,
            None => return,
        };
        let positions = match world.storage_mut::<Position>() {
            Some(storage) => storage,
            None => return,
        };

        for (entity, velocity) in velocities.iter() {
            if let Some(position) = positions.get_mut(entity) {
                position.x += velocity.dx * dt;
                position.y += velocity.dy * dt;
            }
        }
    }
}

// Counts lifetimes down and queues expired entities for destruction.
struct ExpirySystem;

impl System for ExpirySystem {
    fn run(&mut self, world: WorldCell<'_>, commands: &mut CommandBuffer, dt: f32) {
        let lifetimes = match world.storage_mut::<Lifetime>() {
            Some(storage) => storage,
            None => return,
        };

        for (entity, lifetime) in lifetimes.iter_mut() {
            lifetime.seconds_left -= dt;
            if lifetime.seconds_left <= 0.0 {
                // Deferred: the destroy lands after every system ran.
                commands.destroy_entity(entity);
            }
        }
    }
}

fn main() {
    env_logger::init();

    println!("=== Sim Engine: Basic ECS Example ===\n");

    let mut world = World::new();
    world.register::<Position>();
    world.register::<Velocity>();
    world.register::<Lifetime>();

    println!("Spawning entities...");
    let projectile = world.create_entity();
    world.set_component(projectile, Position { x: 0.0, y: 0.0 });
    world.set_component(projectile, Velocity { dx: 10.0, dy: 5.0 });
    world.set_component(projectile, Lifetime { seconds_left: 0.5 });

    let scenery = world.create_entity();
    world.set_component(scenery, Position { x: 100.0, y: 100.0 });

    println!("  {} entities alive", world.entity_count());

    let mut scheduler = Scheduler::new();
    scheduler.add_system(MovementSystem);
    scheduler.add_system(ExpirySystem);

    println!("\nSimulating 60 ticks at 60 Hz...");
    for tick in 0..60 {
        scheduler.tick(&mut world, 1.0 / 60.0);

        if tick % 15 == 0 {
            if let Some(position) = world.get_component::<Position>(projectile) {
                println!("  tick {tick:2}: projectile at ({:.2}, {:.2})", position.x, position.y);
            } else {
                println!("  tick {tick:2}: projectile expired");
            }
        }
    }

    println!("\nAfter simulation:");
    println!("  {} entities alive", world.entity_count());
    println!("  projectile alive: {}", world.is_alive(projectile));
    println!("  scenery alive:    {}", world.is_alive(scenery));
}
