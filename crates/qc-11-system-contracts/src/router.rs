//! # Selector Router
//!
//! Per-contract route table from 4-byte selector to handler, plus the
//! uniform decode -> invoke -> encode pipeline every system contract uses.
//!
//! A handler receives its decoded arguments and returns either its outputs
//! or a `ContractError`. The error side is the business-error channel: when
//! it is taken, the call fails and no return data is produced.

use crate::codec::{encode_return_value, extract_params, AbiValue, ArgKind, Args};
use crate::domain::services::compute_selector;
use crate::domain::value_objects::Selector;
use crate::errors::{CodecError, ContractError, DispatchError};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Native callable behind a route.
pub type HandlerFn = dyn Fn(&Args) -> Result<Vec<AbiValue>, ContractError> + Send + Sync;

/// Builds the canonical signature `name(type1,type2,...)`.
#[must_use]
pub fn canonical_signature(name: &str, inputs: &[ArgKind]) -> String {
    let types: Vec<&str> = inputs.iter().map(|kind| kind.type_name()).collect();
    format!("{name}({})", types.join(","))
}

/// Splits `"name(t1,t2)"` into its name and argument kinds.
///
/// # Errors
///
/// `UnsupportedType` for a malformed signature or an unknown type name.
pub fn parse_signature(signature: &str) -> Result<(&str, Vec<ArgKind>), CodecError> {
    let malformed = || CodecError::UnsupportedType(signature.to_string());
    let open = signature.find('(').ok_or_else(malformed)?;
    let inner = signature[open + 1..]
        .strip_suffix(')')
        .ok_or_else(malformed)?;
    let name = signature[..open].trim();
    if name.is_empty() {
        return Err(malformed());
    }
    if inner.trim().is_empty() {
        return Ok((name, Vec::new()));
    }
    let kinds = inner
        .split(',')
        .map(ArgKind::from_type_name)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name, kinds))
}

// =============================================================================
// HANDLER DESCRIPTOR
// =============================================================================

/// One registered route. Immutable once registered.
pub struct HandlerDescriptor {
    name: String,
    selector: Selector,
    inputs: Vec<ArgKind>,
    outputs: Vec<ArgKind>,
    handler: Box<HandlerFn>,
}

impl HandlerDescriptor {
    /// Method name without the argument list.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Selector derived from the canonical signature.
    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Declared argument kinds.
    #[must_use]
    pub fn inputs(&self) -> &[ArgKind] {
        &self.inputs
    }

    /// Declared output kinds, excluding the error channel.
    #[must_use]
    pub fn outputs(&self) -> &[ArgKind] {
        &self.outputs
    }

    /// Canonical signature this route was registered under.
    #[must_use]
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("signature", &self.signature())
            .field("selector", &self.selector)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Route table for one system contract.
pub struct Router {
    contract: String,
    routes: HashMap<Selector, HandlerDescriptor>,
}

impl Router {
    /// Creates an empty router. `contract` labels log output.
    #[must_use]
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            routes: HashMap::new(),
        }
    }

    /// Label of the contract this router serves.
    #[must_use]
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Registers `handler` under `name(inputs...)` and returns its selector.
    ///
    /// A later registration with the same selector replaces the earlier one.
    pub fn register<F>(
        &mut self,
        name: &str,
        inputs: &[ArgKind],
        outputs: &[ArgKind],
        handler: F,
    ) -> Selector
    where
        F: Fn(&Args) -> Result<Vec<AbiValue>, ContractError> + Send + Sync + 'static,
    {
        let selector = compute_selector(&canonical_signature(name, inputs));
        let descriptor = HandlerDescriptor {
            name: name.to_string(),
            selector,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            handler: Box::new(handler),
        };
        if self.routes.insert(selector, descriptor).is_some() {
            warn!(contract = %self.contract, %selector, method = name, "route replaced");
        }
        debug!(contract = %self.contract, %selector, method = name, "route registered");
        selector
    }

    /// Registers `handler` under a textual signature such as `"Read(uint64,uint64)"`.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` if the signature names a type outside the supported set.
    pub fn register_signature<F>(
        &mut self,
        signature: &str,
        outputs: &[ArgKind],
        handler: F,
    ) -> Result<Selector, CodecError>
    where
        F: Fn(&Args) -> Result<Vec<AbiValue>, ContractError> + Send + Sync + 'static,
    {
        let (name, inputs) = parse_signature(signature)?;
        Ok(self.register(name, &inputs, outputs, handler))
    }

    /// Looks up the route for `selector`.
    #[must_use]
    pub fn route(&self, selector: &Selector) -> Option<&HandlerDescriptor> {
        self.routes.get(selector)
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Executes one call end to end.
    ///
    /// # Errors
    ///
    /// - `MissingSelector` if `input` is shorter than 4 bytes
    /// - `RouteNotFound` if no handler is registered for the selector
    /// - `Decode` if the arguments cannot be decoded (handler not invoked)
    /// - `Handler` with the handler's business error (no return data)
    /// - `ReturnKindMismatch` if the outputs disagree with the declared kinds
    #[instrument(skip(self, input), fields(contract = %self.contract, input_len = input.len()))]
    pub fn dispatch(&self, input: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let (selector, payload) =
            Selector::split(input).ok_or(DispatchError::MissingSelector { len: input.len() })?;
        let route = self
            .routes
            .get(&selector)
            .ok_or(DispatchError::RouteNotFound(selector))?;

        let args = extract_params(payload, &route.inputs).map_err(DispatchError::Decode)?;
        debug!(method = %route.name, %selector, "invoking system contract method");

        let outputs = (route.handler)(&Args::new(args)).map_err(|err| {
            debug!(method = %route.name, error = %err, "handler reported error");
            err
        })?;

        let produced: Vec<ArgKind> = outputs.iter().map(AbiValue::kind).collect();
        if produced != route.outputs {
            return Err(DispatchError::ReturnKindMismatch {
                selector,
                expected: route.outputs.clone(),
                found: produced,
            });
        }
        Ok(encode_return_value(&outputs))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("contract", &self.contract)
            .field("routes", &self.routes.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ObjectStoreError;

    fn call(selector: Selector, args: &[AbiValue]) -> Vec<u8> {
        let mut input = selector.as_bytes().to_vec();
        input.extend(encode_return_value(args));
        input
    }

    fn greeter() -> Router {
        let mut router = Router::new("greeter");
        router.register("test1", &[], &[], |_| Ok(vec![]));
        router.register(
            "test4",
            &[ArgKind::String, ArgKind::UInt64],
            &[ArgKind::String, ArgKind::UInt64],
            |args| {
                let greeting = format!("Hello {}", args.string(0)?);
                Ok(vec![greeting.into(), args.u64(1)?.into()])
            },
        );
        router.register(
            "test5",
            &[ArgKind::String, ArgKind::UInt64],
            &[ArgKind::String],
            |_| Err(ContractError::InvalidArgument("permission deny".to_string())),
        );
        router
    }

    #[test]
    fn test_canonical_signature() {
        assert_eq!(
            canonical_signature("Read", &[ArgKind::UInt64, ArgKind::UInt64]),
            "Read(uint64,uint64)"
        );
        assert_eq!(canonical_signature("Close", &[]), "Close()");
    }

    #[test]
    fn test_parse_signature() {
        let (name, kinds) = parse_signature("ReceiveFunds(address,uint64,string,uint64)").unwrap();
        assert_eq!(name, "ReceiveFunds");
        assert_eq!(
            kinds,
            vec![ArgKind::Address, ArgKind::UInt64, ArgKind::String, ArgKind::UInt64]
        );

        let (name, kinds) = parse_signature("Length()").unwrap();
        assert_eq!(name, "Length");
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_parse_signature_rejects_unknown_types() {
        assert_eq!(
            parse_signature("f(int256)"),
            Err(CodecError::UnsupportedType("int256".to_string()))
        );
        assert!(parse_signature("no_parens").is_err());
        assert!(parse_signature("(uint64)").is_err());
    }

    #[test]
    fn test_register_computes_selector() {
        let mut router = Router::new("test");
        let selector = router.register("Method1", &[ArgKind::String, ArgKind::UInt64], &[], |_| {
            Ok(vec![])
        });
        assert_eq!(selector, compute_selector("Method1(string,uint64)"));
        assert!(router.route(&selector).is_some());
    }

    #[test]
    fn test_register_signature_matches_register() {
        let mut router = Router::new("test");
        let a = router
            .register_signature("Write(bytes)", &[ArgKind::UInt64], |_| Ok(vec![0u64.into()]))
            .unwrap();
        assert_eq!(a.to_string(), "0x5f10585d");
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut router = Router::new("test");
        router.register("f", &[], &[ArgKind::UInt64], |_| Ok(vec![1u64.into()]));
        let selector = router.register("f", &[], &[ArgKind::UInt64], |_| Ok(vec![2u64.into()]));
        assert_eq!(router.len(), 1);
        let out = router.dispatch(selector.as_bytes()).unwrap();
        assert_eq!(out, encode_return_value(&[2u64.into()]));
    }

    #[test]
    fn test_dispatch_no_outputs_returns_empty() {
        let router = greeter();
        let out = router.dispatch(compute_selector("test1()").as_bytes()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_dispatch_encodes_outputs() {
        let router = greeter();
        let input = call(
            compute_selector("test4(string,uint64)"),
            &["bob".into(), 30u64.into()],
        );
        let out = router.dispatch(&input).unwrap();
        assert_eq!(
            out,
            encode_return_value(&["Hello bob".into(), 30u64.into()])
        );
    }

    #[test]
    fn test_dispatch_handler_error_suppresses_output() {
        let router = greeter();
        let input = call(
            compute_selector("test5(string,uint64)"),
            &["bob".into(), 30u64.into()],
        );
        let err = router.dispatch(&input).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Handler(ContractError::InvalidArgument("permission deny".to_string()))
        );
    }

    #[test]
    fn test_dispatch_unknown_selector() {
        let router = greeter();
        let err = router.dispatch(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert_eq!(
            err,
            DispatchError::RouteNotFound(Selector::new([0xde, 0xad, 0xbe, 0xef]))
        );
    }

    #[test]
    fn test_dispatch_short_input() {
        let router = greeter();
        assert_eq!(
            router.dispatch(&[0x01, 0x02]),
            Err(DispatchError::MissingSelector { len: 2 })
        );
    }

    #[test]
    fn test_dispatch_decode_error_skips_handler() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let mut router = Router::new("test");
        let selector = router.register("f", &[ArgKind::UInt64], &[], move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(vec![])
        });

        let err = router.dispatch(selector.as_bytes()).unwrap_err();
        assert!(matches!(err, DispatchError::Decode(CodecError::OutOfBounds { .. })));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dispatch_rejects_undeclared_outputs() {
        let mut router = Router::new("test");
        let selector = router.register("f", &[], &[ArgKind::UInt64], |_| Ok(vec!["oops".into()]));
        let err = router.dispatch(selector.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            DispatchError::ReturnKindMismatch {
                selector,
                expected: vec![ArgKind::UInt64],
                found: vec![ArgKind::String],
            }
        );
    }

    #[test]
    fn test_dispatch_propagates_collaborator_error() {
        let mut router = Router::new("test");
        let selector = router.register("f", &[], &[], |_| {
            Err(ObjectStoreError::NotFound("obj".to_string()).into())
        });
        let err = router.dispatch(selector.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "object not found: obj");
    }
}
