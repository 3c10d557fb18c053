//! Hook runtime.
//!
//! A component receives a [`Hooks`] value for the duration of one render.
//! Hook slots are matched to the previous render purely by call order, so a
//! component must call the same hooks in the same order every time.

use std::any::Any;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::element::{Component, Node, Props};
use crate::fiber::{FiberArena, FiberId, FiberState, FiberUpdateQueue};
use crate::flags::{Flags, HookFlags, SYNC_LANE};
use crate::list::CircularList;
use crate::owned::Owned;
use crate::scheduler::ScheduleUpdate;

/// One hook slot of a function component.
#[derive(Clone)]
pub struct Hook {
    memoized_state: HookState,
    base_state: Option<Rc<dyn Any>>,
    queue: Option<Owned<StateQueue>>,
}

#[derive(Clone)]
enum HookState {
    Value(Rc<dyn Any>),
    Effect(Owned<Effect>),
}

/// Pending actions of a state or reducer hook, oldest first.
#[derive(Default)]
pub struct StateQueue {
    pending: CircularList<Box<dyn Any>>,
}

pub type EffectCreate = Box<dyn FnOnce() -> EffectCleanup>;

/// Teardown returned by an effect.
#[derive(Default)]
pub struct EffectCleanup(Option<Box<dyn FnOnce()>>);

impl EffectCleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl From<()> for EffectCleanup {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

/// Destroy slot shared by every render's record of the same effect hook.
#[derive(Default)]
pub(crate) struct EffectInstance {
    destroy: Option<Box<dyn FnOnce()>>,
}

impl EffectInstance {
    pub(crate) fn take_destroy(&mut self) -> Option<Box<dyn FnOnce()>> {
        self.destroy.take()
    }

    pub(crate) fn set_destroy(&mut self, cleanup: EffectCleanup) {
        self.destroy = cleanup.0;
    }
}

pub struct Effect {
    pub(crate) tag: HookFlags,
    create: Option<EffectCreate>,
    inst: Owned<EffectInstance>,
    deps: Option<Deps>,
}

impl Effect {
    pub(crate) fn take_create(&mut self) -> Option<EffectCreate> {
        self.create.take()
    }

    pub(crate) fn instance(&self) -> Owned<EffectInstance> {
        self.inst.clone()
    }

    pub fn deps(&self) -> Option<&Deps> {
        self.deps.as_ref()
    }
}

/// One entry of a dependency list, compared against the entry at the same
/// position in the previous render.
trait DepValue {
    fn as_any(&self) -> &dyn Any;
    fn same_as(&self, other: &dyn DepValue) -> bool;
}

impl<T: PartialEq + 'static> DepValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn DepValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Dependency list of an effect. Entries keep their values and compare with
/// `PartialEq`; entries of different types never match.
#[derive(Clone, Default)]
pub struct Deps(Vec<Rc<dyn DepValue>>);

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: PartialEq + 'static>(mut self, value: T) -> Self {
        self.0.push(Rc::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Deps {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && are_hook_inputs_equal(self, other)
    }
}

impl std::fmt::Debug for Deps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deps").field("len", &self.0.len()).finish()
    }
}

/// Build a [`Deps`] list from cloneable values: `deps![count, name]`.
#[macro_export]
macro_rules! deps {
    () => {
        $crate::Deps::new()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::Deps::new()$(.with(::std::clone::Clone::clone(&$dep)))+
    };
}

fn are_hook_inputs_equal(next: &Deps, prev: &Deps) -> bool {
    if next.len() != prev.len() {
        log::warn!(
            "effect dependency list changed size between renders ({} -> {}); \
             the list must keep a constant length",
            prev.len(),
            next.len()
        );
    }
    next.0.iter().zip(&prev.0).all(|(a, b)| (**a).same_as(&**b))
}

type ErasedReducer<'r> = &'r dyn Fn(&dyn Any, Box<dyn Any>) -> Rc<dyn Any>;
type ErasedInit<'i> = Box<dyn FnOnce() -> Rc<dyn Any> + 'i>;

/// Behavior of each hook for one render phase.
pub(crate) trait HookDispatcher {
    fn use_reducer(
        &self,
        hooks: &mut Hooks<'_>,
        reducer: ErasedReducer<'_>,
        init: ErasedInit<'_>,
    ) -> (Rc<dyn Any>, Owned<StateQueue>);

    fn use_effect(&self, hooks: &mut Hooks<'_>, create: EffectCreate, deps: Option<Deps>);

    fn use_ref(&self, hooks: &mut Hooks<'_>, init: ErasedInit<'_>) -> Rc<dyn Any>;
}

struct MountDispatcher;
struct UpdateDispatcher;

static HOOKS_DISPATCHER_ON_MOUNT: MountDispatcher = MountDispatcher;
static HOOKS_DISPATCHER_ON_UPDATE: UpdateDispatcher = UpdateDispatcher;

impl HookDispatcher for MountDispatcher {
    fn use_reducer(
        &self,
        hooks: &mut Hooks<'_>,
        _reducer: ErasedReducer<'_>,
        init: ErasedInit<'_>,
    ) -> (Rc<dyn Any>, Owned<StateQueue>) {
        let state = init();
        let queue = Owned::new(StateQueue::default());
        hooks.mount_work_in_progress_hook(Hook {
            memoized_state: HookState::Value(state.clone()),
            base_state: Some(state.clone()),
            queue: Some(queue.clone()),
        });
        (state, queue)
    }

    fn use_effect(&self, hooks: &mut Hooks<'_>, create: EffectCreate, deps: Option<Deps>) {
        hooks.flags |= Flags::PASSIVE;
        let effect = hooks.push_effect(
            HookFlags::HAS_EFFECT | HookFlags::PASSIVE,
            create,
            Owned::new(EffectInstance::default()),
            deps,
        );
        hooks.mount_work_in_progress_hook(Hook {
            memoized_state: HookState::Effect(effect),
            base_state: None,
            queue: None,
        });
    }

    fn use_ref(&self, hooks: &mut Hooks<'_>, init: ErasedInit<'_>) -> Rc<dyn Any> {
        let value = init();
        hooks.mount_work_in_progress_hook(Hook {
            memoized_state: HookState::Value(value.clone()),
            base_state: None,
            queue: None,
        });
        value
    }
}

impl HookDispatcher for UpdateDispatcher {
    fn use_reducer(
        &self,
        hooks: &mut Hooks<'_>,
        reducer: ErasedReducer<'_>,
        _init: ErasedInit<'_>,
    ) -> (Rc<dyn Any>, Owned<StateQueue>) {
        let position = hooks.cursor;
        let hook = hooks.update_work_in_progress_hook();
        let (Some(queue), HookState::Value(state)) = (hook.queue.clone(), &hook.memoized_state)
        else {
            panic!("hook {position} was not a state hook in the previous render");
        };

        let mut state = hook.base_state.clone().unwrap_or_else(|| state.clone());
        let actions = queue.update(|q| q.pending.take_all());
        for action in actions {
            state = reducer(&*state, action);
        }
        hook.memoized_state = HookState::Value(state.clone());
        hook.base_state = Some(state.clone());
        (state, queue)
    }

    fn use_effect(&self, hooks: &mut Hooks<'_>, create: EffectCreate, deps: Option<Deps>) {
        let position = hooks.cursor;
        let HookState::Effect(previous) = hooks.update_work_in_progress_hook().memoized_state.clone()
        else {
            panic!("hook {position} was not an effect hook in the previous render");
        };
        let (inst, prev_deps) = previous.with(|effect| (effect.inst.clone(), effect.deps.clone()));

        let unchanged = match (&deps, &prev_deps) {
            (Some(next), Some(prev)) => are_hook_inputs_equal(next, prev),
            _ => false,
        };
        let tag = if unchanged {
            HookFlags::PASSIVE
        } else {
            hooks.flags |= Flags::PASSIVE;
            HookFlags::HAS_EFFECT | HookFlags::PASSIVE
        };
        let effect = hooks.push_effect(tag, create, inst, deps);
        hooks.current_work_in_progress_hook().memoized_state = HookState::Effect(effect);
    }

    fn use_ref(&self, hooks: &mut Hooks<'_>, _init: ErasedInit<'_>) -> Rc<dyn Any> {
        let position = hooks.cursor;
        match &hooks.update_work_in_progress_hook().memoized_state {
            HookState::Value(value) => value.clone(),
            HookState::Effect(_) => {
                panic!("hook {position} was not a ref hook in the previous render")
            }
        }
    }
}

/// Render-scoped hook registers handed to a component.
pub struct Hooks<'a> {
    fiber: FiberId,
    dispatcher: &'static dyn HookDispatcher,
    current_hooks: &'a [Hook],
    cursor: usize,
    work_in_progress_hooks: Vec<Hook>,
    effects: CircularList<Owned<Effect>>,
    flags: Flags,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl<'a> Hooks<'a> {
    /// The fiber being rendered.
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, SetState<T>) {
        let (value, dispatch) = self.use_reducer(basic_state_reducer::<T>, init);
        (value, SetState { dispatch })
    }

    pub fn use_reducer<S, A, R>(&mut self, reducer: R, init: impl FnOnce() -> S) -> (S, Dispatch<A>)
    where
        S: Clone + 'static,
        A: 'static,
        R: Fn(&S, A) -> S,
    {
        let erased = |state: &dyn Any, action: Box<dyn Any>| -> Rc<dyn Any> {
            let state = state
                .downcast_ref::<S>()
                .unwrap_or_else(|| panic!("reducer state changed type between renders"));
            let action = action
                .downcast::<A>()
                .unwrap_or_else(|_| panic!("action dispatched with the wrong type"));
            let next: Rc<dyn Any> = Rc::new(reducer(state, *action));
            next
        };
        let init: ErasedInit<'_> = Box::new(move || {
            let state: Rc<dyn Any> = Rc::new(init());
            state
        });

        let dispatcher = self.dispatcher;
        let (state, queue) = dispatcher.use_reducer(self, &erased, init);
        let value = state
            .downcast_ref::<S>()
            .cloned()
            .unwrap_or_else(|| panic!("reducer state changed type between renders"));
        let dispatch = Dispatch {
            fiber: self.fiber,
            queue,
            scheduler: self.scheduler.clone(),
            _action: PhantomData,
        };
        (value, dispatch)
    }

    /// Schedule `create` to run after the commit. With `Some(deps)` it only
    /// runs again once an entry changes; with `None` it runs after every
    /// render.
    pub fn use_effect<F, C>(&mut self, create: F, deps: Option<Deps>)
    where
        F: FnOnce() -> C + 'static,
        C: Into<EffectCleanup>,
    {
        let dispatcher = self.dispatcher;
        dispatcher.use_effect(self, Box::new(move || create().into()), deps);
    }

    /// A mutable cell that persists across renders and never triggers one.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Owned<T> {
        let init: ErasedInit<'_> = Box::new(move || {
            let cell: Rc<dyn Any> = Rc::new(Owned::new(init()));
            cell
        });
        let dispatcher = self.dispatcher;
        dispatcher
            .use_ref(self, init)
            .downcast_ref::<Owned<T>>()
            .cloned()
            .unwrap_or_else(|| panic!("ref changed type between renders"))
    }

    fn mount_work_in_progress_hook(&mut self, hook: Hook) {
        self.work_in_progress_hooks.push(hook);
    }

    fn update_work_in_progress_hook(&mut self) -> &mut Hook {
        let Some(previous) = self.current_hooks.get(self.cursor) else {
            panic!("Rendered more hooks than during the previous render.");
        };
        self.cursor += 1;
        self.work_in_progress_hooks.push(previous.clone());
        self.current_work_in_progress_hook()
    }

    fn current_work_in_progress_hook(&mut self) -> &mut Hook {
        let last = self.work_in_progress_hooks.len() - 1;
        &mut self.work_in_progress_hooks[last]
    }

    fn push_effect(
        &mut self,
        tag: HookFlags,
        create: EffectCreate,
        inst: Owned<EffectInstance>,
        deps: Option<Deps>,
    ) -> Owned<Effect> {
        let effect = Owned::new(Effect {
            tag,
            create: Some(create),
            inst,
            deps,
        });
        self.effects.push(effect.clone());
        effect
    }

    fn finish(self) -> (Vec<Hook>, CircularList<Owned<Effect>>, Flags) {
        if self.cursor < self.current_hooks.len() {
            panic!("Rendered fewer hooks than expected.");
        }
        (self.work_in_progress_hooks, self.effects, self.flags)
    }
}

/// Render `component` for `wip`, threading hook state from `current`.
pub(crate) fn render_with_hooks(
    arena: &mut FiberArena,
    current: Option<FiberId>,
    wip: FiberId,
    component: &Component,
    props: &Props,
    scheduler: &Weak<dyn ScheduleUpdate>,
) -> Node {
    let previous = current
        .and_then(|current| match &arena[current].memoized_state {
            FiberState::Hooks(list) if !list.is_empty() => Some(list.clone()),
            _ => None,
        })
        .unwrap_or_default();
    let dispatcher: &'static dyn HookDispatcher = if previous.is_empty() {
        &HOOKS_DISPATCHER_ON_MOUNT
    } else {
        &HOOKS_DISPATCHER_ON_UPDATE
    };

    let mut hooks = Hooks {
        fiber: wip,
        dispatcher,
        current_hooks: &previous,
        cursor: 0,
        work_in_progress_hooks: Vec::with_capacity(previous.len()),
        effects: CircularList::new(),
        flags: Flags::NONE,
        scheduler: scheduler.clone(),
    };
    let children = component.render(&mut hooks, props);
    let (list, effects, flags) = hooks.finish();

    let fiber = &mut arena[wip];
    fiber.memoized_state = FiberState::Hooks(list);
    fiber.update_queue = if effects.is_empty() {
        FiberUpdateQueue::None
    } else {
        FiberUpdateQueue::Effects(Rc::new(effects))
    };
    fiber.flags |= flags;
    children
}

/// Handle that enqueues actions for a reducer hook.
pub struct Dispatch<A> {
    fiber: FiberId,
    queue: Owned<StateQueue>,
    scheduler: Weak<dyn ScheduleUpdate>,
    _action: PhantomData<fn(A)>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            fiber: self.fiber,
            queue: self.queue.clone(),
            scheduler: self.scheduler.clone(),
            _action: PhantomData,
        }
    }
}

impl<A: 'static> Dispatch<A> {
    /// Enqueue `action` and schedule a render of the owning fiber.
    ///
    /// Outside a render or commit this renders synchronously before
    /// returning. Dispatching to an unmounted component does nothing.
    pub fn dispatch(&self, action: A) {
        self.queue.update(|q| q.pending.push(Box::new(action)));
        match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.schedule_update_on_fiber(self.fiber, SYNC_LANE),
            None => log::trace!("dispatch on {:?} after its root was dropped", self.fiber),
        }
    }
}

pub enum StateAction<T> {
    Replace(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

fn basic_state_reducer<T: Clone>(state: &T, action: StateAction<T>) -> T {
    match action {
        StateAction::Replace(value) => value,
        StateAction::Update(f) => f(state),
    }
}

/// Setter returned by [`Hooks::use_state`].
pub struct SetState<T> {
    dispatch: Dispatch<StateAction<T>>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<T: 'static> SetState<T> {
    pub fn set(&self, value: T) {
        self.dispatch.dispatch(StateAction::Replace(value));
    }

    /// Compute the next value from the latest queued one.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.dispatch.dispatch(StateAction::Update(Box::new(f)));
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
