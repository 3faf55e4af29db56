//! Simulated parallel build
//!
//! Generates a seeded build plan and plays it through worker tasks, each
//! emitting progress events for its task and for the nested units of work
//! inside it. About a third of the tasks are up-to-date and finish as soon
//! as they start.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use wipline_core::constants::progress::BUILD_PROGRESS_CATEGORY;
use wipline_core::events::{OperationId, OutputEvent, ProgressCompleteEvent};
use wipline_core::EventSender;

const PROJECTS: &[&str] = &["app", "core", "api", "model", "util", "web", "cli"];

const TASKS: &[(&str, &[&str])] = &[
    ("compileJava", &["Resolving dependencies", "Compiling"]),
    ("compileKotlin", &["Resolving dependencies", "Compiling"]),
    ("processResources", &["Copying"]),
    ("jar", &["Packaging"]),
    ("test", &["Compiling", "Running tests"]),
    ("javadoc", &["Generating"]),
    ("lint", &["Analyzing"]),
];

const TASK_CATEGORY: &str = "task";
const WORK_CATEGORY: &str = "work";

/// One unit of work inside a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    pub name: String,
    pub ticks: u32,
    pub tick: Duration,
}

/// A task to run: up-to-date tasks have no steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan {
    pub path: String,
    pub steps: Vec<StepPlan>,
}

impl TaskPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Build a deterministic plan of `tasks` tasks from `seed`
pub fn plan_build(tasks: usize, seed: u64) -> Vec<TaskPlan> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..tasks)
        .map(|index| {
            let project = PROJECTS[rng.gen_range(0..PROJECTS.len())];
            let (task, step_names) = TASKS[index % TASKS.len()];
            let steps = if rng.gen_bool(0.3) {
                Vec::new()
            } else {
                step_names
                    .iter()
                    .map(|name| StepPlan {
                        name: name.to_string(),
                        ticks: rng.gen_range(1..=12),
                        tick: Duration::from_millis(rng.gen_range(40..=250)),
                    })
                    .collect()
            };
            TaskPlan {
                path: format!(":{}:{}", project, task),
                steps,
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct IdSource(AtomicU64);

impl IdSource {
    fn next(&self) -> OperationId {
        OperationId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Run `plan` on `workers` concurrent workers, then end the stream
pub async fn run(plan: Vec<TaskPlan>, workers: usize, events: EventSender) {
    let ids = Arc::new(IdSource::default());
    let total = plan.len();
    let root = ids.next();
    events.send(OutputEvent::start(
        root,
        None,
        BUILD_PROGRESS_CATEGORY,
        Some("Build"),
        Some("EXECUTING"),
    ));
    info!(tasks = total, workers, "Starting simulated build");

    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut running = JoinSet::new();
    for task in plan {
        let permits = Arc::clone(&permits);
        let ids = Arc::clone(&ids);
        let events = events.clone();
        running.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            run_task(task, root, &ids, &events).await;
        });
    }

    while let Some(result) = running.join_next().await {
        if let Err(e) = result {
            warn!("Build worker failed: {}", e);
        }
    }

    events.send(OutputEvent::log(
        TASK_CATEGORY,
        format!("BUILD SUCCESSFUL\n{} actionable tasks", total),
    ));
    events.send(OutputEvent::complete(root));
    events.send(OutputEvent::end());
}

async fn run_task(task: TaskPlan, root: OperationId, ids: &IdSource, events: &EventSender) {
    let id = ids.next();
    events.send(OutputEvent::start(
        id,
        Some(root),
        TASK_CATEGORY,
        Some(&task.path),
        None,
    ));

    if task.is_up_to_date() {
        events.send(complete_with_status(id, "UP-TO-DATE"));
        events.send(OutputEvent::log(
            TASK_CATEGORY,
            format!("> Task {} UP-TO-DATE", task.path),
        ));
        return;
    }

    for step in &task.steps {
        let child = ids.next();
        events.send(OutputEvent::start(
            child,
            Some(id),
            WORK_CATEGORY,
            Some(&step.name),
            None,
        ));
        for tick in 1..=step.ticks {
            tokio::time::sleep(step.tick).await;
            events.send(OutputEvent::progress(
                child,
                format!("{} {}/{}", step.name, tick, step.ticks),
            ));
        }
        events.send(OutputEvent::complete(child));
    }

    events.send(OutputEvent::complete(id));
    events.send(OutputEvent::log(TASK_CATEGORY, format!("> Task {}", task.path)));
}

fn complete_with_status(id: OperationId, status: &str) -> OutputEvent {
    OutputEvent::ProgressComplete(ProgressCompleteEvent {
        id,
        status: Some(status.to_string()),
        timestamp: Utc::now(),
    })
}
