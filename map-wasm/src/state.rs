use std::cell::RefCell;
use std::rc::Rc;

use radiation_core::MapViewSession;
use web_sys::{Document, Window};

use crate::leaflet::LeafletSurface;

/// Runtime state of the import map, shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub session: MapViewSession<LeafletSurface>,
    pub import_id: Option<String>,
}

/// Thread local storage for the single map instance of the page.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}

pub fn current() -> Option<Rc<RefCell<State>>> {
    STATE.with(|st| st.borrow().clone())
}

/// Install `state` and hand back whatever was installed before.
pub fn replace(state: Option<Rc<RefCell<State>>>) -> Option<Rc<RefCell<State>>> {
    STATE.with(|st| st.replace(state))
}

/// Run `f` against the live state, if any.
pub fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> Option<R> {
    let st = current()?;
    let mut s = st.borrow_mut();
    Some(f(&mut s))
}
