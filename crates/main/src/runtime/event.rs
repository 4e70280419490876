////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    fmt::{Debug, Formatter},
    sync::{Arc, Mutex},
};

use compact_str::CompactString;

use crate::runtime::{
    receiver,
    Func,
    FuncArgs,
    Reflect,
    RuntimeResult,
    TypeInfo,
    Value,
};

/// A list of the event handlers of a reflected object.
///
/// The handlers are [Funcs](Func) that accept the `Args` tuple and return
/// nothing. A handler is detached by identity: detaching a Func removes the
/// handler that was attached with the same Func or with a Func unboxed from
/// the same function object.
///
/// ```
/// use std::sync::{
///     atomic::{AtomicUsize, Ordering},
///     Arc,
/// };
///
/// use ad_astra_reflect::runtime::{Event, Func};
///
/// let event = Event::<(usize,)>::default();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let handler = {
///     let total = total.clone();
///
///     Func::new(move |delta: usize| {
///         let _ = total.fetch_add(delta, Ordering::SeqCst);
///     })
/// };
///
/// event.attach(handler.clone());
/// event.fire((3,)).unwrap();
///
/// assert!(event.detach(&handler));
///
/// event.fire((5,)).unwrap();
///
/// assert_eq!(total.load(Ordering::SeqCst), 3);
/// ```
pub struct Event<Args> {
    handlers: Mutex<Vec<Func<Args, ()>>>,
}

impl<Args> Default for Event<Args> {
    #[inline(always)]
    fn default() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<Args> Debug for Event<Args> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Event")
            .field("handlers", &self.len())
            .finish()
    }
}

impl<Args> Event<Args> {
    /// Returns the number of the attached handlers.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Args: FuncArgs + Clone> Event<Args> {
    #[inline(always)]
    pub fn attach(&self, handler: Func<Args, ()>) {
        self.handlers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(handler);
    }

    /// Removes the most recently attached handler with the same identity.
    /// Returns false if there is no such handler.
    pub fn detach(&self, handler: &Func<Args, ()>) -> bool {
        let mut handlers = self
            .handlers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        match handlers
            .iter()
            .rposition(|candidate| Func::ptr_eq(candidate, handler))
        {
            Some(index) => {
                let _ = handlers.remove(index);
                true
            }

            None => false,
        }
    }

    /// Calls every attached handler in attachment order.
    ///
    /// The handlers are called outside of the event's lock. The first failed
    /// handler interrupts the notification.
    pub fn fire(&self, arguments: Args) -> RuntimeResult<()> {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();

        for handler in handlers {
            handler.call(arguments.clone())?;
        }

        Ok(())
    }
}

type EventAccess = dyn Fn(&Value, &Value) -> RuntimeResult<()> + Send + Sync;

/// A description of the reflected type event.
///
/// The EventInfo refers to the [Event] field of the receiver through an
/// accessor function.
pub struct EventInfo {
    name: CompactString,
    handler_type: Arc<TypeInfo>,
    attach: Box<EventAccess>,
    detach: Box<EventAccess>,
}

impl Debug for EventInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("EventInfo")
            .field("name", &self.name)
            .field("handler_type", &self.handler_type)
            .finish_non_exhaustive()
    }
}

impl EventInfo {
    /// Creates an event description.
    ///
    /// The `accessor` returns the event field of the `This` receiver.
    pub fn new<This, Args>(name: &str, accessor: fn(&This) -> &Event<Args>) -> Self
    where
        This: Reflect,
        Args: FuncArgs + Clone,
    {
        Self {
            name: CompactString::from(name),
            handler_type: TypeInfo::of::<Func<Args, ()>>(),

            attach: Box::new(move |this, handler| {
                let this = receiver::<This>(Some(this))?;
                let handler = Func::<Args, ()>::unbox_parameter(handler, None, Some("handler"))?;

                accessor(this.get()).attach(handler.into_inner());

                Ok(())
            }),

            detach: Box::new(move |this, handler| {
                let this = receiver::<This>(Some(this))?;
                let handler = Func::<Args, ()>::unbox_parameter(handler, None, Some("handler"))?;

                let _ = accessor(this.get()).detach(&handler);

                Ok(())
            }),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type info of the event handler function.
    #[inline(always)]
    pub fn handler_type(&self) -> &Arc<TypeInfo> {
        &self.handler_type
    }

    /// Subscribes the `handler` function to the event of the `this` object.
    #[inline(always)]
    pub fn attach(&self, this: &Value, handler: Value) -> RuntimeResult<()> {
        (self.attach)(this, &handler)
    }

    /// Unsubscribes the `handler` function from the event of the `this`
    /// object.
    ///
    /// Detaching a handler that is not attached is not an error.
    #[inline(always)]
    pub fn detach(&self, this: &Value, handler: Value) -> RuntimeResult<()> {
        (self.detach)(this, &handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::runtime::{Event, EventInfo, Func, ObjectBase, Ptr, Reflectable, Value};

    #[derive(Default)]
    struct Button {
        object: ObjectBase,
        clicked: Event<(usize,)>,
    }

    impl Reflectable for Button {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    #[test]
    fn test_event_info() {
        let info = EventInfo::new::<Ptr<Button>, (usize,)>("clicked", |this| &this.clicked);

        assert_eq!(info.handler_type().to_string(), "Function<Void, usize>");

        let button = Ptr::new(Button::default());
        let this = Value::from_ptr(button.clone());

        let clicks = Arc::new(AtomicUsize::new(0));

        let handler = {
            let clicks = clicks.clone();

            Value::give(Func::new(move |count: usize| {
                let _ = clicks.fetch_add(count, Ordering::SeqCst);
            }))
            .unwrap()
        };

        info.attach(&this, handler.clone()).unwrap();

        assert_eq!(button.clicked.len(), 1);

        button.clicked.fire((2,)).unwrap();

        assert_eq!(clicks.load(Ordering::SeqCst), 2);

        info.detach(&this, handler).unwrap();

        assert!(button.clicked.is_empty());
        assert!(info.attach(&this, Value::give(1).unwrap()).is_err());
        assert!(info.attach(&Value::null(), Value::null()).is_err());
    }
}
