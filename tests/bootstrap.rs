//! Bootstrap specifier encoding and dynamic constant / call-site resolution.

mod common;

use common::MockEnv;
use klasspool::prelude::*;

/// Builds a pool with one `Dynamic` entry whose specifier carries the given
/// static arguments (all integer constants), returning
/// (pool, dynamic index, specifier index, argument pool indices).
fn pool_with_dynamic(symbols: &SymbolTable, argument_values: &[i32]) -> (ConstantPool, u16, u16, Vec<u16>) {
    let mut builder = PoolBuilder::new(symbols.intern("Main"), LoaderId::BOOTSTRAP);

    let holder_name = builder.push_utf8(symbols.intern("com/example/Bootstraps"));
    let holder = builder.push_class(holder_name);
    let bsm_name = builder.push_utf8(symbols.intern("makeConstant"));
    let bsm_desc = builder.push_utf8(symbols.intern(
        "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/Class;)Ljava/lang/Object;",
    ));
    let bsm_nat = builder.push_name_and_type(bsm_name, bsm_desc);
    let bsm_method = builder.push_method_ref(holder, bsm_nat);
    let bsm_handle = builder.push_method_handle(RefKind::InvokeStatic as u8, bsm_method);

    let arguments: Vec<u16> = argument_values
        .iter()
        .map(|&value| builder.push_integer(value))
        .collect();
    let specifier = builder.push_bootstrap_specifier(bsm_handle, &arguments);

    let value_name = builder.push_utf8(symbols.intern("CONSTANT"));
    let value_desc = builder.push_utf8(symbols.intern("Ljava/lang/Object;"));
    let nat = builder.push_name_and_type(value_name, value_desc);
    let dynamic = builder.push_dynamic(specifier, nat);

    (builder.build().unwrap(), dynamic, specifier, arguments)
}

#[test]
fn operand_accessors_round_trip() {
    let symbols = SymbolTable::new();
    let (pool, dynamic, specifier, arguments) = pool_with_dynamic(&symbols, &[11, 22, 33]);

    assert_eq!(pool.bootstrap_specifier_index_at(dynamic), specifier);
    assert_eq!(pool.operand_argument_count_at(specifier), 3);
    for (n, &argument) in arguments.iter().enumerate() {
        assert_eq!(pool.operand_argument_index_at(specifier, n as u16), argument);
    }
}

#[test]
fn contiguous_specifiers_round_trip() {
    // Pseudo-random argument list lengths; the encoding packs them end to
    // end and must reproduce every tuple exactly.
    let lengths = [0usize, 3, 1, 7, 0, 2, 5];

    let symbols = SymbolTable::new();
    let mut builder = PoolBuilder::new(symbols.intern("Main"), LoaderId::BOOTSTRAP);
    let holder_name = builder.push_utf8(symbols.intern("B"));
    let holder = builder.push_class(holder_name);
    let n = builder.push_utf8(symbols.intern("bsm"));
    let d = builder.push_utf8(symbols.intern("()Ljava/lang/Object;"));
    let nat = builder.push_name_and_type(n, d);
    let bsm_method = builder.push_method_ref(holder, nat);
    let bsm_handle = builder.push_method_handle(RefKind::InvokeStatic as u8, bsm_method);

    let mut written: Vec<Vec<u16>> = Vec::new();
    for (i, &len) in lengths.iter().enumerate() {
        let arguments: Vec<u16> = (0..len)
            .map(|k| builder.push_integer((i * 100 + k) as i32))
            .collect();
        let specifier = builder.push_bootstrap_specifier(bsm_handle, &arguments);
        assert_eq!(specifier as usize, i);
        written.push(arguments);
    }
    let value_nat = builder.push_name_and_type(n, d);
    builder.push_dynamic(0, value_nat);
    let pool = builder.build().unwrap();

    for (i, arguments) in written.iter().enumerate() {
        let specifier = i as u16;
        assert_eq!(pool.operand_bootstrap_method_ref_index_at(specifier), bsm_handle);
        assert_eq!(pool.operand_argument_count_at(specifier) as usize, arguments.len());
        for (k, &argument) in arguments.iter().enumerate() {
            assert_eq!(pool.operand_argument_index_at(specifier, k as u16), argument);
        }
    }
}

#[test]
fn dynamic_constant_resolution_invokes_bootstrap_once() {
    let symbols = SymbolTable::new();
    let (pool, dynamic, _, _) = pool_with_dynamic(&symbols, &[1, 2, 3]);
    let env = MockEnv::new();

    let first = pool.resolve_constant_at(dynamic, &env).unwrap();
    assert_eq!(env.bootstrap_calls(), 1);
    // The fully resolved specifier reached the orchestrator.
    let (name, descriptor, argc) = env.last_specifier().unwrap();
    assert_eq!(name, "CONSTANT");
    assert_eq!(descriptor, "Ljava/lang/Object;");
    assert_eq!(argc, 3);

    // The product is cached in the reference table; no re-invocation.
    let second = pool.resolve_constant_at(dynamic, &env).unwrap();
    assert_eq!(first, second);
    let third = pool.resolve_bootstrap_specifier_at(dynamic, &env).unwrap();
    assert_eq!(first, third);
    assert_eq!(env.bootstrap_calls(), 1);
}

#[test]
fn bootstrap_failure_is_sticky() {
    let symbols = SymbolTable::new();
    let (pool, dynamic, _, _) = pool_with_dynamic(&symbols, &[5]);
    let env = MockEnv::new();
    env.fail_bootstrap();

    let first = pool.resolve_constant_at(dynamic, &env).unwrap_err();
    match &first {
        Error::Linkage { kind, .. } => assert_eq!(*kind, LinkageKind::BootstrapMethodFailed),
        other => panic!("expected linkage error, got {other:?}"),
    }
    assert_eq!(pool.tag_at(dynamic), Tag::DynamicInError);
    assert_eq!(env.bootstrap_calls(), 1);

    let repeat = pool.resolve_constant_at(dynamic, &env).unwrap_err();
    assert_eq!(repeat.to_string(), first.to_string());
    assert_eq!(env.bootstrap_calls(), 1);
}

#[test]
fn invokedynamic_site_binds_with_appendix() {
    let symbols = SymbolTable::new();
    let mut builder = PoolBuilder::new(symbols.intern("Main"), LoaderId::BOOTSTRAP);
    let holder_name = builder.push_utf8(symbols.intern("B"));
    let holder = builder.push_class(holder_name);
    let n = builder.push_utf8(symbols.intern("bsm"));
    let d = builder.push_utf8(symbols.intern("()Ljava/lang/invoke/CallSite;"));
    let nat = builder.push_name_and_type(n, d);
    let bsm_method = builder.push_method_ref(holder, nat);
    let bsm_handle = builder.push_method_handle(RefKind::InvokeStatic as u8, bsm_method);
    let specifier = builder.push_bootstrap_specifier(bsm_handle, &[]);
    let site_name = builder.push_utf8(symbols.intern("apply"));
    let site_desc = builder.push_utf8(symbols.intern("()Ljava/lang/Runnable;"));
    let site_nat = builder.push_name_and_type(site_name, site_desc);
    let indy = builder.push_invoke_dynamic(specifier, site_nat);
    let pool = builder.build().unwrap();

    let env = MockEnv::new();

    // The linking path: invoke the bootstrap, then bind the rewritten site
    // with the call-site product as its appendix.
    let appendix = pool.resolve_bootstrap_specifier_at(indy, &env).unwrap();
    let appendix_reference = pool.reference_index_at(indy).unwrap();

    let cache = ResolutionCache::new(&[], &[], &[indy]);
    let entry = cache.indy_entry_at(0);
    assert!(!entry.is_resolved());

    let target = std::sync::Arc::new(Method {
        holder: symbols.intern("java/lang/invoke/MethodHandle"),
        name: symbols.intern("invokeExact"),
        descriptor: symbols.intern("([Ljava/lang/Object;)Ljava/lang/Object;"),
        flags: MethodFlags::PUBLIC,
        vtable_index: None,
    });
    entry.set_method_handle(target, Some(appendix_reference));

    assert!(entry.is_resolved());
    assert!(entry.has_appendix());
    assert_eq!(entry.appendix_if_resolved(&pool), Some(appendix));
    assert!(entry.check_resolution_failed().is_ok());
}
