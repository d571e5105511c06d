// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative frame scheduler.
//!
//! Cinematic tasks are plain futures polled once per frame on the logic
//! thread. They suspend at explicit yield points:
//! - end of the current frame ([`FrameScheduler::next_frame`])
//! - expiry of a timed wait ([`FrameScheduler::wait_seconds`])
//! - a predicate or asynchronous operation completing ([`FrameScheduler::wait_until`])
//!
//! Nothing here is `Send`; there is no parallelism and no locking. State
//! shared between tasks must never be borrowed across an `.await`.

use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Upper bound on same-tick spawn passes before the rest are deferred
const MAX_SPAWN_PASSES: usize = 64;

/// Tolerance for timed waits so accumulated frame deltas land on the deadline
const DEADLINE_EPSILON: f64 = 1e-6;

/// Snapshot of the frame clock
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the scheduler started
    pub now: f64,
    /// Duration of the last frame in seconds
    pub delta: f32,
    /// Number of ticks so far
    pub frame: u64,
}

/// Shared read handle to the frame clock
#[derive(Debug, Clone, Default)]
pub struct FrameClock(Rc<Cell<FrameTime>>);

impl FrameClock {
    /// Current frame snapshot
    pub fn time(&self) -> FrameTime {
        self.0.get()
    }

    /// Seconds since the scheduler started
    pub fn now(&self) -> f64 {
        self.0.get().now
    }

    /// Duration of the last frame
    pub fn delta(&self) -> f32 {
        self.0.get().delta
    }

    /// Current frame number
    pub fn frame(&self) -> u64 {
        self.0.get().frame
    }

    fn advance(&self, delta: f32) {
        let mut time = self.0.get();
        time.now += f64::from(delta);
        time.delta = delta;
        time.frame += 1;
        self.0.set(time);
    }
}

/// Unique identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
struct TaskState {
    cancelled: Cell<bool>,
    finished: Cell<bool>,
}

struct Task {
    state: Rc<TaskState>,
    future: LocalBoxFuture<'static, ()>,
}

/// Handle to a spawned task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Rc<TaskState>,
}

impl TaskHandle {
    /// Task identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Drop the task before its next poll
    pub fn cancel(&self) {
        self.state.cancelled.set(true);
    }

    /// Whether the task ran to completion or was cancelled
    pub fn is_finished(&self) -> bool {
        self.state.finished.get() || self.state.cancelled.get()
    }
}

type LateHook = Box<dyn FnMut(&FrameTime) -> bool>;

struct SchedulerInner {
    clock: FrameClock,
    tasks: RefCell<Vec<Task>>,
    spawned: RefCell<Vec<Task>>,
    late_hooks: RefCell<Vec<LateHook>>,
    next_task_id: Cell<u64>,
}

/// Single-threaded cooperative scheduler driven by the host frame loop
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

impl FrameScheduler {
    /// Create an idle scheduler at time zero
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                clock: FrameClock::default(),
                tasks: RefCell::new(Vec::new()),
                spawned: RefCell::new(Vec::new()),
                late_hooks: RefCell::new(Vec::new()),
                next_task_id: Cell::new(1),
            }),
        }
    }

    /// Shared clock handle
    pub fn clock(&self) -> FrameClock {
        self.inner.clock.clone()
    }

    /// Seconds since the scheduler started
    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    /// Schedule a task. It is first polled on the current or next tick.
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) -> TaskHandle {
        let id = TaskId(self.inner.next_task_id.get());
        self.inner.next_task_id.set(id.0 + 1);

        let state = Rc::new(TaskState::default());
        self.inner.spawned.borrow_mut().push(Task {
            state: state.clone(),
            future: future.boxed_local(),
        });

        TaskHandle { id, state }
    }

    /// Register a hook that runs after all tasks every tick.
    ///
    /// The hook is removed once it returns `false`.
    pub fn add_late_update(&self, hook: impl FnMut(&FrameTime) -> bool + 'static) {
        self.inner.late_hooks.borrow_mut().push(Box::new(hook));
    }

    /// Number of live tasks, including ones spawned but not yet polled
    pub fn task_count(&self) -> usize {
        let live = |tasks: &[Task]| tasks.iter().filter(|t| !t.state.cancelled.get()).count();
        live(&self.inner.tasks.borrow()[..]) + live(&self.inner.spawned.borrow()[..])
    }

    /// Whether no tasks remain
    pub fn is_idle(&self) -> bool {
        self.task_count() == 0
    }

    /// Advance one frame: move the clock, poll tasks, run late hooks.
    ///
    /// Tasks spawned by a late hook get their first poll in the same tick.
    pub fn tick(&self, delta: f32) {
        self.inner.clock.advance(delta.max(0.0));

        let mut running = std::mem::take(&mut *self.inner.tasks.borrow_mut());
        running.append(&mut self.inner.spawned.borrow_mut());
        self.poll_tasks(running);

        self.run_late_hooks();

        let late = std::mem::take(&mut *self.inner.spawned.borrow_mut());
        if !late.is_empty() {
            self.poll_tasks(late);
        }
    }

    fn poll_tasks(&self, mut running: Vec<Task>) {

        let mut survivors = Vec::with_capacity(running.len());
        let mut cx = Context::from_waker(noop_waker_ref());

        for _ in 0..MAX_SPAWN_PASSES {
            for mut task in running.drain(..) {
                if task.state.cancelled.get() {
                    continue;
                }
                match task.future.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => task.state.finished.set(true),
                    Poll::Pending => survivors.push(task),
                }
            }

            running.append(&mut self.inner.spawned.borrow_mut());
            if running.is_empty() {
                break;
            }
        }

        if !running.is_empty() {
            tracing::warn!(
                deferred = running.len(),
                "Spawn chain exceeded {MAX_SPAWN_PASSES} passes in one tick; deferring"
            );
            survivors.append(&mut running);
        }

        self.inner.tasks.borrow_mut().append(&mut survivors);
    }

    fn run_late_hooks(&self) {
        let time = self.inner.clock.time();
        let mut hooks = std::mem::take(&mut *self.inner.late_hooks.borrow_mut());
        hooks.retain_mut(|hook| hook(&time));

        let mut late_hooks = self.inner.late_hooks.borrow_mut();
        hooks.append(&mut late_hooks);
        *late_hooks = hooks;
    }

    /// Resolves on the next tick
    pub fn next_frame(&self) -> NextFrame {
        NextFrame {
            clock: self.clock(),
            target: self.inner.clock.frame() + 1,
        }
    }

    /// Resolves once `seconds` of frame time have elapsed
    pub fn wait_seconds(&self, seconds: f64) -> WaitSeconds {
        WaitSeconds {
            clock: self.clock(),
            deadline: self.now() + seconds.max(0.0),
        }
    }

    /// Resolves on the first poll where `predicate` returns `true`
    pub fn wait_until<F: FnMut() -> bool>(&self, predicate: F) -> WaitUntil<F> {
        WaitUntil { predicate }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`FrameScheduler::next_frame`]
#[derive(Debug)]
pub struct NextFrame {
    clock: FrameClock,
    target: u64,
}

impl Future for NextFrame {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.frame() >= self.target {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Future returned by [`FrameScheduler::wait_seconds`]
#[derive(Debug)]
pub struct WaitSeconds {
    clock: FrameClock,
    deadline: f64,
}

impl Future for WaitSeconds {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now() + DEADLINE_EPSILON >= self.deadline {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Future returned by [`FrameScheduler::wait_until`]
pub struct WaitUntil<F> {
    predicate: F,
}

impl<F: FnMut() -> bool + Unpin> Future for WaitUntil<F> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if (self.predicate)() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
