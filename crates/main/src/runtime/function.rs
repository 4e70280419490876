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
    marker::PhantomData,
    sync::Arc,
};

use compact_str::CompactString;

use crate::runtime::{
    error::{fail, type_mismatch},
    object::object_address,
    FuncArgs,
    ObjectBase,
    Ptr,
    Reflect,
    Reflectable,
    RuntimeError,
    RuntimeResult,
    Shape,
    TypeDescriptor,
    TypeInfo,
    Unboxed,
    Value,
};

/// The universal function interface of the reflected callables.
///
/// A [Reflectable] object exposes this interface through the
/// [as_function](Reflectable::as_function) accessor.
pub trait ValueFunctionProxy: Send + Sync {
    /// Calls the function with the boxed arguments and returns the boxed
    /// result.
    fn invoke(&self, arguments: &[Value]) -> RuntimeResult<Value>;
}

type Callable<Args, R> = dyn Fn(Args) -> RuntimeResult<R> + Send + Sync;

/// A shared Rust callable that can cross the reflection boundary.
///
/// The `Args` parameter is a tuple of the argument types, and `R` is the
/// result type.
///
/// Boxing a Func wraps it into a function proxy object. Unboxing the proxy
/// back into a Func of the same signature recovers the original callable.
/// Unboxing any other function object produces a new Func that boxes the
/// arguments, calls the object, and unboxes the result.
///
/// ```
/// use ad_astra_reflect::runtime::{Func, Value};
///
/// let double = Func::new(|x: i32| x * 2);
///
/// let boxed = Value::give(double.clone()).unwrap();
/// let unboxed = boxed.unbox::<Func<(i32,), i32>>().unwrap();
///
/// assert_eq!(unboxed.call((21,)).unwrap(), 42);
/// assert!(Func::ptr_eq(&double, &unboxed));
/// ```
pub struct Func<Args, R> {
    callable: Arc<Callable<Args, R>>,
    identity: usize,
}

impl<Args, R> Clone for Func<Args, R> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self {
            callable: self.callable.clone(),
            identity: self.identity,
        }
    }
}

impl<Args, R> Debug for Func<Args, R> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("Func({:#x})", self.identity))
    }
}

impl<Args: FuncArgs, R: Reflect> Func<Args, R> {
    /// Creates a Func from a Rust function or closure.
    #[inline(always)]
    pub fn new<F: IntoFunc<Args, R>>(function: F) -> Self {
        function.into_func()
    }

    /// Creates a Func from a fallible callable that accepts the tuple of
    /// arguments.
    pub fn try_new(callable: impl Fn(Args) -> RuntimeResult<R> + Send + Sync + 'static) -> Self {
        let callable: Arc<Callable<Args, R>> = Arc::new(callable);
        let identity = Arc::as_ptr(&callable) as *const () as usize;

        Self { callable, identity }
    }

    /// Calls the function.
    #[inline(always)]
    pub fn call(&self, arguments: Args) -> RuntimeResult<R> {
        (self.callable)(arguments)
    }

    /// Returns true if both Funcs refer to the same callable.
    ///
    /// A Func unboxed from a foreign function object refers to the object's
    /// identity.
    #[inline(always)]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.identity == other.identity
    }
}

/// A conversion of the Rust functions and closures into the [Func].
///
/// The trait is implemented for the functions of up to six parameters.
pub trait IntoFunc<Args, R> {
    fn into_func(self) -> Func<Args, R>;
}

macro_rules! impl_into_func {
    ($($argument:ident),*) => {
        impl<Callable, R, $($argument,)*> IntoFunc<($($argument,)*), R> for Callable
        where
            Callable: Fn($($argument),*) -> R + Send + Sync + 'static,
            R: Reflect,
            $($argument: Reflect,)*
        {
            #[inline]
            #[allow(non_snake_case)]
            fn into_func(self) -> Func<($($argument,)*), R> {
                Func::try_new(move |($($argument,)*)| Ok((self)($($argument),*)))
            }
        }
    };
}

impl_into_func!();
impl_into_func!(A);
impl_into_func!(A, B);
impl_into_func!(A, B, C);
impl_into_func!(A, B, C, D);
impl_into_func!(A, B, C, D, E);
impl_into_func!(A, B, C, D, E, F);

/// A reflectable object that exposes the [Func] through the
/// [ValueFunctionProxy] interface.
pub struct NativeFunctionProxy<Args, R> {
    object: ObjectBase,
    function: Func<Args, R>,
}

impl<Args: FuncArgs, R: Reflect> Reflectable for NativeFunctionProxy<Args, R> {
    #[inline(always)]
    fn object(&self) -> &ObjectBase {
        &self.object
    }

    #[inline(always)]
    fn as_function(&self) -> Option<&dyn ValueFunctionProxy> {
        Some(self)
    }
}

impl<Args: FuncArgs, R: Reflect> ValueFunctionProxy for NativeFunctionProxy<Args, R> {
    fn invoke(&self, arguments: &[Value]) -> RuntimeResult<Value> {
        let arguments = Args::unbox_arguments(arguments, None)?;

        self.function.call(arguments)?.box_parameter(None)
    }
}

impl<Args: FuncArgs, R: Reflect> NativeFunctionProxy<Args, R> {
    #[inline(always)]
    pub fn new(function: Func<Args, R>) -> Self {
        Self {
            object: ObjectBase::new(),
            function,
        }
    }

    /// Returns the wrapped Func.
    #[inline(always)]
    pub fn function(&self) -> &Func<Args, R> {
        &self.function
    }
}

// Keeps the foreign function object alive while the synthesized Func exists.
struct ForeignFunction<Args, R> {
    object: Ptr<dyn Reflectable>,
    marker: PhantomData<fn(Args) -> R>,
}

impl<Args: FuncArgs, R: Reflect> ForeignFunction<Args, R> {
    fn call(&self, arguments: Args) -> RuntimeResult<R> {
        let arguments = arguments.box_arguments()?;

        let Some(function) = self.object.as_function() else {
            return fail(RuntimeError::ObjectDisposed {
                type_name: CompactString::from("Function"),
            });
        };

        let result = function.invoke(&arguments)?;

        Ok(R::unbox_parameter(&result, None, Some("result"))?.into_inner())
    }
}

impl<Args: FuncArgs, R: Reflect> Reflect for Func<Args, R> {
    const SHAPE: Shape = Shape::FUNCTION;

    #[inline(always)]
    fn create_type_info() -> TypeInfo {
        TypeInfo::function(TypeInfo::of::<R>(), Args::parameter_types())
    }

    #[inline]
    fn box_parameter(self, _descriptor: Option<&Arc<TypeDescriptor>>) -> RuntimeResult<Value> {
        Ok(Value::from_ptr(Ptr::new(NativeFunctionProxy::new(self))))
    }

    fn unbox_parameter(
        value: &Value,
        _descriptor: Option<&Arc<TypeDescriptor>>,
        name: Option<&str>,
    ) -> RuntimeResult<Unboxed<Self>> {
        let Some(object) = value.live_object(name)? else {
            return type_mismatch(name, TypeInfo::of::<Self>(), value.type_name());
        };

        if let Some(proxy) = (*object)
            .as_any()
            .downcast_ref::<NativeFunctionProxy<Args, R>>()
        {
            return Ok(Unboxed::Owned(proxy.function.clone()));
        }

        if object.as_function().is_none() {
            return type_mismatch(name, TypeInfo::of::<Self>(), value.type_name());
        }

        let identity = object_address(&object);

        let foreign = ForeignFunction::<Args, R> {
            object: Ptr::from_arc(object),
            marker: PhantomData,
        };

        let mut function = Func::try_new(move |arguments| foreign.call(arguments));

        function.identity = identity;

        Ok(Unboxed::Owned(function))
    }

    #[inline]
    fn try_satisfies(value: &Value) -> bool {
        match value.peek_object() {
            Some(object) => object.as_function().is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::runtime::{
        Func,
        ObjectBase,
        Ptr,
        Reflect,
        Reflectable,
        RuntimeError,
        RuntimeResult,
        Value,
        ValueFunctionProxy,
    };

    #[derive(Default)]
    struct Doubler {
        object: ObjectBase,
        calls: AtomicUsize,
    }

    impl Reflectable for Doubler {
        fn object(&self) -> &ObjectBase {
            &self.object
        }

        fn as_function(&self) -> Option<&dyn ValueFunctionProxy> {
            Some(self)
        }
    }

    impl ValueFunctionProxy for Doubler {
        fn invoke(&self, arguments: &[Value]) -> RuntimeResult<Value> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);

            let number = arguments[0].unbox::<i64>()?;

            Value::give(*number * 2)
        }
    }

    #[test]
    fn test_function_round_trip() {
        let concat = Func::new(|a: String, b: bool| format!("{a}:{b}"));

        let first = Value::give(concat.clone()).unwrap();
        let unboxed = first.unbox::<Func<(String, bool), String>>().unwrap();

        assert!(unboxed.is_owned());
        assert!(Func::ptr_eq(&concat, &unboxed));

        let second = Value::give(unboxed.into_inner()).unwrap();
        let recovered = second.unbox::<Func<(String, bool), String>>().unwrap();

        assert!(Func::ptr_eq(&concat, &recovered));
        assert_eq!(
            recovered.call((String::from("x"), true)).unwrap(),
            concat.call((String::from("x"), true)).unwrap(),
        );
    }

    #[test]
    fn test_proxy_invocation() {
        let add = Func::new(|a: i32, b: i32| a + b);
        let boxed = Value::give(add).unwrap();

        let proxy = boxed.object().unwrap();
        let proxy = proxy.as_function().unwrap();

        let result = proxy
            .invoke(&[Value::give(2).unwrap(), Value::give(3).unwrap()])
            .unwrap();

        assert_eq!(*result.unbox::<i32>().unwrap(), 5);

        match proxy.invoke(&[Value::give(2).unwrap()]) {
            Err(RuntimeError::ArgumentCountMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_foreign_function() {
        let doubler = Ptr::new(Doubler::default());
        let boxed = Value::from_ptr(doubler.clone());

        assert!(Func::<(i64,), i64>::try_satisfies(&boxed));
        assert!(!Func::<(i64,), i64>::try_satisfies(&Value::give(1i64).unwrap()));

        let first = boxed.unbox::<Func<(i64,), i64>>().unwrap();
        let second = boxed.unbox::<Func<(i64,), i64>>().unwrap();

        assert!(Func::ptr_eq(&first, &second));
        assert_eq!(doubler.object().counter(), 4);

        assert_eq!(first.call((21,)).unwrap(), 42);
        assert_eq!(doubler.calls.load(Ordering::SeqCst), 1);

        let mismatch = boxed.unbox::<Func<(i64,), bool>>().unwrap();

        match mismatch.call((1,)) {
            Err(RuntimeError::TypeMismatch { name, .. }) => {
                assert_eq!(name.as_deref(), Some("result"));
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }
}
