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

use crate::{
    report::system_panic,
    runtime::{
        error::fail,
        Reflect,
        RuntimeError,
        RuntimeResult,
        TypeDescriptor,
        TypeInfo,
        Unboxed,
        Value,
    },
};

/// A tuple of the Rust function arguments that can be unboxed from, and boxed
/// into, a slice of [Values](Value).
///
/// The trait is implemented for the tuples of up to six [Reflect] types.
pub trait FuncArgs: Sized + Send + 'static {
    /// The number of the arguments.
    const ARITY: usize;

    /// Returns the type infos of the arguments in order.
    fn parameter_types() -> Vec<Arc<TypeInfo>>;

    /// Boxes each argument into a Value, left to right.
    fn box_arguments(self) -> RuntimeResult<Vec<Value>>;

    /// Unboxes each argument from the `arguments` slice, left to right.
    ///
    /// The optional `parameters` metadata provides the diagnostic names and
    /// the declared types of the arguments. The function fails on the first
    /// argument that cannot be unboxed.
    fn unbox_arguments(
        arguments: &[Value],
        parameters: Option<&[ParameterInfo]>,
    ) -> RuntimeResult<Self>;

    /// Returns true if each argument satisfies the corresponding parameter
    /// type.
    fn satisfies(arguments: &[Value]) -> bool;
}

/// A Rust function that can be invoked with the boxed arguments.
///
/// The trait is implemented for the functions and closures of up to six
/// parameters, where each parameter type and the return type implement
/// [Reflect].
pub trait NativeFunction<Args: FuncArgs>: Send + Sync + 'static {
    /// Returns the type info of the function's result.
    fn return_type() -> Arc<TypeInfo>;

    /// Unboxes the `arguments`, calls the function, and boxes the result.
    ///
    /// The `result` is the declared descriptor of the returned data, if
    /// known.
    fn dispatch(
        &self,
        arguments: &[Value],
        parameters: Option<&[ParameterInfo]>,
        result: Option<&Arc<TypeDescriptor>>,
    ) -> RuntimeResult<Value>;
}

/// A Rust function that accepts a receiver of type `This` followed by the
/// boxed arguments.
///
/// The trait is implemented for the functions and closures of up to six
/// parameters following the `&This` receiver.
pub trait NativeMethod<This: Reflect, Args: FuncArgs>: Send + Sync + 'static {
    /// Returns the type info of the method's result.
    fn return_type() -> Arc<TypeInfo>;

    /// Unboxes the receiver and the `arguments`, calls the method, and boxes
    /// the result.
    fn dispatch(
        &self,
        this: &Value,
        arguments: &[Value],
        parameters: Option<&[ParameterInfo]>,
        result: Option<&Arc<TypeDescriptor>>,
    ) -> RuntimeResult<Value>;
}

macro_rules! impl_arity {
    ($arity:expr; $($argument:ident $index:tt),*) => {
        impl<$($argument: Reflect,)*> FuncArgs for ($($argument,)*) {
            const ARITY: usize = $arity;

            #[inline]
            fn parameter_types() -> Vec<Arc<TypeInfo>> {
                vec![$(TypeInfo::of::<$argument>(),)*]
            }

            #[inline]
            #[allow(unused_mut, unused_variables)]
            fn box_arguments(self) -> RuntimeResult<Vec<Value>> {
                let mut result = Vec::with_capacity($arity);

                $(
                result.push(self.$index.box_parameter(None)?);
                )*

                Ok(result)
            }

            #[inline]
            #[allow(unused_variables)]
            fn unbox_arguments(
                arguments: &[Value],
                parameters: Option<&[ParameterInfo]>,
            ) -> RuntimeResult<Self> {
                check_arity(None, $arity, arguments.len())?;

                Ok(($(
                    unbox_argument::<$argument>(arguments, parameters, $index)?.into_inner(),
                )*))
            }

            #[inline]
            #[allow(unused_variables)]
            fn satisfies(arguments: &[Value]) -> bool {
                if arguments.len() != $arity {
                    return false;
                }

                $(
                if !$argument::try_satisfies(&arguments[$index]) {
                    return false;
                }
                )*

                true
            }
        }

        impl<Callable, Ret, $($argument,)*> NativeFunction<($($argument,)*)> for Callable
        where
            Callable: Fn($($argument),*) -> Ret + Send + Sync + 'static,
            Ret: Reflect,
            $($argument: Reflect,)*
        {
            #[inline(always)]
            fn return_type() -> Arc<TypeInfo> {
                TypeInfo::of::<Ret>()
            }

            #[inline]
            #[allow(non_snake_case)]
            fn dispatch(
                &self,
                arguments: &[Value],
                parameters: Option<&[ParameterInfo]>,
                result: Option<&Arc<TypeDescriptor>>,
            ) -> RuntimeResult<Value> {
                let ($($argument,)*) =
                    <($($argument,)*) as FuncArgs>::unbox_arguments(arguments, parameters)?;

                (self)($($argument),*).box_parameter(result)
            }
        }

        impl<Callable, This, Ret, $($argument,)*> NativeMethod<This, ($($argument,)*)> for Callable
        where
            Callable: Fn(&This, $($argument),*) -> Ret + Send + Sync + 'static,
            This: Reflect,
            Ret: Reflect,
            $($argument: Reflect,)*
        {
            #[inline(always)]
            fn return_type() -> Arc<TypeInfo> {
                TypeInfo::of::<Ret>()
            }

            #[inline]
            #[allow(non_snake_case)]
            fn dispatch(
                &self,
                this: &Value,
                arguments: &[Value],
                parameters: Option<&[ParameterInfo]>,
                result: Option<&Arc<TypeDescriptor>>,
            ) -> RuntimeResult<Value> {
                let receiver = receiver::<This>(Some(this))?;

                let ($($argument,)*) =
                    <($($argument,)*) as FuncArgs>::unbox_arguments(arguments, parameters)?;

                (self)(receiver.get(), $($argument),*).box_parameter(result)
            }
        }
    };
}

impl_arity!(0;);
impl_arity!(1; A 0);
impl_arity!(2; A 0, B 1);
impl_arity!(3; A 0, B 1, C 2);
impl_arity!(4; A 0, B 1, C 2, D 3);
impl_arity!(5; A 0, B 1, C 2, D 3, E 4);
impl_arity!(6; A 0, B 1, C 2, D 3, E 4, F 5);

/// Invokes the Rust function with the boxed arguments.
///
/// ```
/// use ad_astra_reflect::runtime::{invoke_function, Value};
///
/// let sum = |a: i32, b: i32| a + b;
///
/// let result = invoke_function(
///     &sum,
///     &[Value::give(2).unwrap(), Value::give(3).unwrap()],
/// )
/// .unwrap();
///
/// assert_eq!(*result.unbox::<i32>().unwrap(), 5);
/// ```
#[inline(always)]
pub fn invoke_function<Args: FuncArgs, F: NativeFunction<Args>>(
    function: &F,
    arguments: &[Value],
) -> RuntimeResult<Value> {
    function.dispatch(arguments, None, None)
}

/// Unboxes the receiver of a method call.
///
/// Fails with [RuntimeError::NullArgument] if the receiver is missing or
/// Null.
pub fn receiver<T: Reflect>(this: Option<&Value>) -> RuntimeResult<Unboxed<T>> {
    match this {
        Some(this) if !this.is_null() => T::unbox_parameter(this, None, Some("this")),

        _ => fail(RuntimeError::NullArgument {
            name: CompactString::from("this"),
        }),
    }
}

#[inline(always)]
fn unbox_argument<T: Reflect>(
    arguments: &[Value],
    parameters: Option<&[ParameterInfo]>,
    index: usize,
) -> RuntimeResult<Unboxed<T>> {
    let parameter = parameters.and_then(|parameters| parameters.get(index));

    let descriptor = parameter.and_then(|parameter| parameter.ty.find_descriptor());
    let name = parameter.map(|parameter| parameter.name.as_str());

    T::unbox_parameter(&arguments[index], descriptor.as_ref(), name)
}

#[inline(always)]
fn check_arity(group: Option<&str>, expected: usize, actual: usize) -> RuntimeResult<()> {
    if expected != actual {
        return fail(RuntimeError::ArgumentCountMismatch {
            group: group.map(CompactString::from),
            expected,
            actual,
        });
    }

    Ok(())
}

/// A description of a method parameter.
#[derive(Clone, Debug)]
pub struct ParameterInfo {
    /// The diagnostic name of the parameter.
    pub name: CompactString,

    /// The declared type of the parameter.
    pub ty: Arc<TypeInfo>,
}

/// A kind of the [MethodInfo].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// The method does not have a receiver.
    Static,

    /// The method requires a receiver.
    Instance,

    /// The method constructs a new instance of the owner type.
    Constructor,
}

/// A description of the invocable type member: a static or an instance
/// method, or a constructor.
///
/// ```
/// use ad_astra_reflect::runtime::{MethodInfo, Value};
///
/// let method = MethodInfo::function("max", &["a", "b"], |a: i32, b: i32| a.max(b));
///
/// let result = method
///     .invoke(None, &[Value::give(3).unwrap(), Value::give(8).unwrap()])
///     .unwrap();
///
/// assert_eq!(*result.unbox::<i32>().unwrap(), 8);
/// ```
pub struct MethodInfo {
    name: CompactString,
    kind: MethodKind,
    parameters: Vec<ParameterInfo>,
    return_type: Arc<TypeInfo>,
    invoker: Box<dyn Invoker>,
}

impl Debug for MethodInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

impl MethodInfo {
    /// Creates a static method.
    ///
    /// The `parameters` are the diagnostic names of the function parameters.
    /// The function panics if the number of the names differs from the number
    /// of the function parameters.
    pub fn function<Args: FuncArgs, F: NativeFunction<Args>>(
        name: &str,
        parameters: &[&str],
        function: F,
    ) -> Self {
        Self::new(
            name,
            MethodKind::Static,
            parameters,
            Args::parameter_types(),
            F::return_type(),
            Box::new(FunctionInvoker {
                function,
                marker: PhantomData,
            }),
        )
    }

    /// Creates an instance method.
    ///
    /// The method receives the unboxed receiver of type `This` as the first
    /// parameter. The `parameters` are the diagnostic names of the remaining
    /// parameters.
    pub fn method<This: Reflect, Args: FuncArgs, F: NativeMethod<This, Args>>(
        name: &str,
        parameters: &[&str],
        method: F,
    ) -> Self {
        Self::new(
            name,
            MethodKind::Instance,
            parameters,
            Args::parameter_types(),
            F::return_type(),
            Box::new(MethodInvoker {
                method,
                marker: PhantomData,
            }),
        )
    }

    /// Creates a constructor.
    pub fn constructor<Args: FuncArgs, F: NativeFunction<Args>>(
        parameters: &[&str],
        function: F,
    ) -> Self {
        Self::new(
            "new",
            MethodKind::Constructor,
            parameters,
            Args::parameter_types(),
            F::return_type(),
            Box::new(FunctionInvoker {
                function,
                marker: PhantomData,
            }),
        )
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    #[inline(always)]
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    #[inline(always)]
    pub fn return_type(&self) -> &Arc<TypeInfo> {
        &self.return_type
    }

    /// Invokes the method.
    ///
    /// The `this` receiver is required for the instance methods and ignored
    /// otherwise.
    ///
    /// The function checks the number of the arguments first, then unboxes the
    /// arguments left to right. Any failure aborts the call before the
    /// underlying Rust function runs.
    pub fn invoke(&self, this: Option<&Value>, arguments: &[Value]) -> RuntimeResult<Value> {
        check_arity(Some(&self.name), self.parameters.len(), arguments.len())?;

        let result = self.return_type.find_descriptor();

        self.invoker
            .invoke(this, arguments, &self.parameters, result.as_ref())
    }

    /// Returns true if the arguments satisfy the method's signature.
    ///
    /// Unlike [invoke](Self::invoke), this function never fails.
    #[inline]
    pub fn try_satisfies(&self, this: Option<&Value>, arguments: &[Value]) -> bool {
        arguments.len() == self.parameters.len() && self.invoker.try_satisfies(this, arguments)
    }

    fn new(
        name: &str,
        kind: MethodKind,
        names: &[&str],
        types: Vec<Arc<TypeInfo>>,
        return_type: Arc<TypeInfo>,
        invoker: Box<dyn Invoker>,
    ) -> Self {
        if names.len() != types.len() {
            system_panic!(
                "Method {name:?} declares {} parameter names for {} parameters.",
                names.len(),
                types.len(),
            );
        }

        let parameters = names
            .iter()
            .zip(types)
            .map(|(name, ty)| ParameterInfo {
                name: CompactString::from(*name),
                ty,
            })
            .collect();

        Self {
            name: CompactString::from(name),
            kind,
            parameters,
            return_type,
            invoker,
        }
    }
}

trait Invoker: Send + Sync + 'static {
    fn invoke(
        &self,
        this: Option<&Value>,
        arguments: &[Value],
        parameters: &[ParameterInfo],
        result: Option<&Arc<TypeDescriptor>>,
    ) -> RuntimeResult<Value>;

    fn try_satisfies(&self, this: Option<&Value>, arguments: &[Value]) -> bool;
}

struct FunctionInvoker<Args, F> {
    function: F,
    marker: PhantomData<fn(Args)>,
}

impl<Args: FuncArgs, F: NativeFunction<Args>> Invoker for FunctionInvoker<Args, F> {
    #[inline(always)]
    fn invoke(
        &self,
        _this: Option<&Value>,
        arguments: &[Value],
        parameters: &[ParameterInfo],
        result: Option<&Arc<TypeDescriptor>>,
    ) -> RuntimeResult<Value> {
        self.function.dispatch(arguments, Some(parameters), result)
    }

    #[inline(always)]
    fn try_satisfies(&self, _this: Option<&Value>, arguments: &[Value]) -> bool {
        Args::satisfies(arguments)
    }
}

struct MethodInvoker<This, Args, F> {
    method: F,
    marker: PhantomData<fn(This, Args)>,
}

impl<This, Args, F> Invoker for MethodInvoker<This, Args, F>
where
    This: Reflect,
    Args: FuncArgs,
    F: NativeMethod<This, Args>,
{
    fn invoke(
        &self,
        this: Option<&Value>,
        arguments: &[Value],
        parameters: &[ParameterInfo],
        result: Option<&Arc<TypeDescriptor>>,
    ) -> RuntimeResult<Value> {
        let Some(this) = this.filter(|this| !this.is_null()) else {
            return fail(RuntimeError::NullArgument {
                name: CompactString::from("this"),
            });
        };

        self.method
            .dispatch(this, arguments, Some(parameters), result)
    }

    #[inline]
    fn try_satisfies(&self, this: Option<&Value>, arguments: &[Value]) -> bool {
        let Some(this) = this else {
            return false;
        };

        This::try_satisfies(this) && Args::satisfies(arguments)
    }
}

/// A named group of overloaded methods.
#[derive(Debug)]
pub struct MethodGroup {
    name: CompactString,
    methods: Vec<Arc<MethodInfo>>,
}

impl MethodGroup {
    #[inline(always)]
    pub(crate) fn new(name: CompactString) -> Self {
        Self {
            name,
            methods: Vec::new(),
        }
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, method: MethodInfo) {
        self.methods.push(Arc::new(method));
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the overloads in declaration order.
    #[inline(always)]
    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    /// Chooses the overload for the `arguments`.
    ///
    /// The overloads with a different number of parameters are discarded. If
    /// exactly one overload remains, it is chosen. Otherwise, the first
    /// overload in declaration order that
    /// [satisfies](MethodInfo::try_satisfies) the arguments is chosen. If none
    /// of them does, the first remaining overload is chosen, so the subsequent
    /// invocation reports a precise type mismatch.
    ///
    /// Fails with [RuntimeError::ArgumentCountMismatch] if no overload accepts
    /// this number of arguments.
    pub fn resolve(&self, this: Option<&Value>, arguments: &[Value]) -> RuntimeResult<&MethodInfo> {
        let mut candidates = self
            .methods
            .iter()
            .filter(|method| method.parameters.len() == arguments.len())
            .peekable();

        let Some(first) = candidates.next() else {
            return fail(RuntimeError::ArgumentCountMismatch {
                group: Some(self.name.clone()),
                expected: self
                    .methods
                    .first()
                    .map(|method| method.parameters.len())
                    .unwrap_or_default(),
                actual: arguments.len(),
            });
        };

        if candidates.peek().is_none() {
            return Ok(first.as_ref());
        }

        if first.try_satisfies(this, arguments) {
            return Ok(first.as_ref());
        }

        for candidate in candidates {
            if candidate.try_satisfies(this, arguments) {
                return Ok(candidate.as_ref());
            }
        }

        Ok(first.as_ref())
    }

    /// Chooses the overload through [resolve](Self::resolve) and invokes it.
    #[inline]
    pub fn invoke(&self, this: Option<&Value>, arguments: &[Value]) -> RuntimeResult<Value> {
        self.resolve(this, arguments)?.invoke(this, arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use compact_str::CompactString;

    use crate::runtime::{
        invoke_function,
        receiver,
        MethodGroup,
        MethodInfo,
        MethodKind,
        ObjectBase,
        Ptr,
        Reflectable,
        RuntimeError,
        Value,
    };

    #[derive(Default)]
    struct Counter {
        object: ObjectBase,
        value: AtomicUsize,
    }

    impl Reflectable for Counter {
        fn object(&self) -> &ObjectBase {
            &self.object
        }
    }

    fn values(numbers: &[i32]) -> Vec<Value> {
        numbers
            .iter()
            .map(|number| Value::give(*number).unwrap())
            .collect()
    }

    #[test]
    fn test_function_dispatch() {
        let concat = |a: String, b: i32| format!("{a}{b}");

        let result = invoke_function(
            &concat,
            &[
                Value::give(String::from("x")).unwrap(),
                Value::give(1).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(result.unbox::<String>().unwrap().as_str(), "x1");

        let nothing = || ();

        assert!(invoke_function(&nothing, &[]).unwrap().is_null());
    }

    #[test]
    fn test_argument_count_mismatch() {
        let method = MethodInfo::function("add", &["a", "b"], |a: i32, b: i32| a + b);

        match method.invoke(None, &values(&[1])) {
            Err(RuntimeError::ArgumentCountMismatch {
                group,
                expected,
                actual,
            }) => {
                assert_eq!(group.as_deref(), Some("add"));
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_failed_unboxing_aborts_call() {
        let calls = Arc::new(AtomicUsize::new(0));

        let method = MethodInfo::function("record", &["first", "second"], {
            let calls = calls.clone();

            move |_: i32, _: i32| {
                let _ = calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let arguments = [Value::give(1).unwrap(), Value::give(true).unwrap()];

        match method.invoke(None, &arguments) {
            Err(RuntimeError::TypeMismatch { name, .. }) => {
                assert_eq!(name, Some(CompactString::from("second")));
            }

            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_instance_method() {
        let method = MethodInfo::method("add", &["delta"], |this: &Ptr<Counter>, delta: usize| {
            this.value.fetch_add(delta, Ordering::SeqCst) + delta
        });

        assert_eq!(method.kind(), MethodKind::Instance);

        let counter = Value::from_ptr(Ptr::new(Counter::default()));

        let result = method
            .invoke(Some(&counter), &[Value::give(5usize).unwrap()])
            .unwrap();

        assert_eq!(*result.unbox::<usize>().unwrap(), 5);

        match method.invoke(Some(&Value::null()), &[Value::give(5usize).unwrap()]) {
            Err(RuntimeError::NullArgument { name }) => assert_eq!(name, "this"),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(receiver::<Ptr<Counter>>(None).is_err());
        assert!(receiver::<Ptr<Counter>>(Some(&counter)).is_ok());
    }

    #[test]
    fn test_overload_resolution() {
        let mut group = MethodGroup::new(CompactString::from("describe"));

        group.push(MethodInfo::function("describe", &["value"], |_: i32| String::from("int")));
        group.push(MethodInfo::function("describe", &["value"], |_: bool| String::from("bool")));
        group.push(MethodInfo::function(
            "describe",
            &["first", "second"],
            |_: i32, _: i32| String::from("pair"),
        ));

        let describe = |arguments: &[Value]| {
            group
                .invoke(None, arguments)
                .map(|result| result.unbox::<String>().unwrap().into_inner())
        };

        assert_eq!(describe(&values(&[1])).unwrap(), "int");
        assert_eq!(describe(&[Value::give(true).unwrap()]).unwrap(), "bool");
        assert_eq!(describe(&values(&[1, 2])).unwrap(), "pair");

        match describe(&[Value::give(1.5f32).unwrap()]) {
            Err(RuntimeError::TypeMismatch { name, expected, .. }) => {
                assert_eq!(name.as_deref(), Some("value"));
                assert_eq!(expected, "i32");
            }

            other => panic!("unexpected result: {other:?}"),
        }

        match describe(&values(&[1, 2, 3])) {
            Err(RuntimeError::ArgumentCountMismatch { group, .. }) => {
                assert_eq!(group.as_deref(), Some("describe"));
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "Method \"add\" declares 1 parameter names for 2 parameters.")]
    fn test_parameter_names_mismatch() {
        let _ = MethodInfo::function("add", &["a"], |a: i32, b: i32| a + b);
    }
}
