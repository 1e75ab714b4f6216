//! The deterministic WASM sandbox and its host API.
//!
//! A hook is a WASM module exporting `hook: i64 -> i64` and its linear
//! `memory`. The sandbox is sealed: no floats, no wall clock, no
//! randomness, no I/O beyond the host API below, and a fuel bound that is
//! itself a consensus parameter. The only imports a module may carry are
//! the host functions, under the `env` module:
//!
//! - `set_state(key_ptr, data_ptr, data_len) -> i64`
//! - `get_state(key_ptr, out_ptr, out_len) -> i64`
//! - `accept(code, reason_ptr, reason_len) -> i64`
//! - `reject(code, reason_ptr, reason_len) -> i64`
//! - `rollback(code, reason_ptr, reason_len) -> i64`
//! - `output_dbg(ptr, len) -> i64`
//!
//! All pointer/length arguments are bounds-checked against linear memory;
//! a bad range returns `OUT_OF_BOUNDS` without terminating the guest.
//! `accept`/`reject`/`rollback` record the exit and terminate the instance
//! through a host error; a guest that returns without calling one of them
//! rolls back.

use wasmi::{core::HostError, AsContextMut, Caller, Engine, ExternType, Linker, Module, Store};

use rill_common::{AccountId, Hash256, HookParams};

use super::error::{ExitType, DOESNT_EXIST, INTERNAL_ERROR, OUT_OF_BOUNDS, TOO_BIG};
use super::state::ChangeBuffer;
use crate::error::TxError;
use crate::state::ApplyView;

/// Module name the host functions live under.
const HOST_MODULE: &str = "env";

/// The host function names, the complete import surface.
const HOST_FUNCTIONS: [&str; 6] = [
    "set_state",
    "get_state",
    "accept",
    "reject",
    "rollback",
    "output_dbg",
];

/// Longest debug line `output_dbg` will emit.
const OUTPUT_DBG_MAX: u32 = 1024;

/// Result of one hook invocation.
#[derive(Debug)]
pub struct HookOutcome {
    pub exit_type: ExitType,
    /// Code the guest passed to its exit call; -1 when it never called one.
    pub exit_code: i64,
    /// Reason bytes the guest passed to its exit call.
    pub reason: Vec<u8>,
    /// The staged state, committed by the caller only on accept.
    pub buffer: ChangeBuffer,
}

/// Exit data recorded by `accept`/`reject`/`rollback`.
struct Exit {
    exit_type: ExitType,
    code: i64,
    reason: Vec<u8>,
}

/// Host-side state of one invocation, owned by the wasmi store.
struct HookInvocation {
    data_max_size: u32,
    buffer: ChangeBuffer,
    exit: Option<Exit>,
}

/// Marker host error used to unwind the guest after an exit call.
#[derive(Debug)]
struct HookExit;

impl std::fmt::Display for HookExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hook exited")
    }
}

impl HostError for HookExit {}

/// The hook execution engine. One instance serves the whole apply path;
/// each invocation gets a fresh store, memory, and change buffer.
pub struct HookRuntime {
    engine: Engine,
    params: HookParams,
}

impl HookRuntime {
    /// Build a runtime with the given resource parameters.
    pub fn new(params: HookParams) -> Self {
        let mut config = wasmi::Config::default();
        config.consume_fuel(true);
        config.floats(false);
        Self {
            engine: Engine::new(&config),
            params,
        }
    }

    /// Instantiate `code` and run its `hook` entry point against the state
    /// of `account`.
    ///
    /// The view is only read (to preload the account's hook state); staged
    /// writes come back in the outcome's buffer.
    ///
    /// # Errors
    ///
    /// [`TxError::HookLoad`] when the module fails validation, carries
    /// imports outside the host API, or lacks the required exports.
    pub fn execute(
        &self,
        view: &ApplyView,
        account: &AccountId,
        code: &[u8],
        data_max_size: u32,
    ) -> Result<HookOutcome, TxError> {
        let module = Module::new(&self.engine, code)
            .map_err(|e| TxError::HookLoad(format!("invalid module: {e}")))?;

        for import in module.imports() {
            let known = import.module() == HOST_MODULE
                && HOST_FUNCTIONS.contains(&import.name())
                && matches!(import.ty(), ExternType::Func(_));
            if !known {
                return Err(TxError::HookLoad(format!(
                    "unknown import {}::{}",
                    import.module(),
                    import.name()
                )));
            }
        }

        let invocation = HookInvocation {
            data_max_size,
            buffer: ChangeBuffer::load(view, account),
            exit: None,
        };
        let mut store = Store::new(&self.engine, invocation);
        store
            .set_fuel(self.params.fuel_limit)
            .map_err(|e| TxError::HookEngine(format!("fuel: {e}")))?;

        let mut linker = Linker::<HookInvocation>::new(&self.engine);
        link_host_functions(&mut linker)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| TxError::HookLoad(format!("instantiation: {e}")))?
            .start(&mut store)
            .map_err(|e| TxError::HookLoad(format!("start: {e}")))?;

        if instance.get_memory(&store, "memory").is_none() {
            return Err(TxError::HookLoad("module exports no memory".into()));
        }
        let entry = instance
            .get_typed_func::<i64, i64>(&store, "hook")
            .map_err(|e| TxError::HookLoad(format!("entry point: {e}")))?;

        match entry.call(&mut store, 0) {
            Ok(_) => {
                // Returned without choosing an outcome.
            }
            Err(err) => {
                if store.data().exit.is_none() {
                    // A genuine trap or fuel exhaustion, not our exit path.
                    tracing::debug!(account = %account, %err, "hook trapped");
                }
            }
        }

        let invocation = store.into_data();
        let outcome = match invocation.exit {
            Some(exit) => HookOutcome {
                exit_type: exit.exit_type,
                exit_code: exit.code,
                reason: exit.reason,
                buffer: invocation.buffer,
            },
            None => HookOutcome {
                exit_type: ExitType::Rollback,
                exit_code: -1,
                reason: Vec::new(),
                buffer: invocation.buffer,
            },
        };
        tracing::debug!(
            account = %account,
            exit_type = ?outcome.exit_type,
            exit_code = outcome.exit_code,
            "hook finished"
        );
        Ok(outcome)
    }
}

/// Borrow the guest memory and the invocation state together.
fn memory_and_state<'a>(
    caller: &'a mut Caller<'_, HookInvocation>,
) -> Option<(&'a mut [u8], &'a mut HookInvocation)> {
    let memory = caller.get_export("memory")?.into_memory()?;
    Some(memory.data_and_store_mut(caller.as_context_mut()))
}

fn in_bounds(memory_len: usize, ptr: u32, len: u32) -> bool {
    match (ptr as u64).checked_add(len as u64) {
        Some(end) => end <= memory_len as u64,
        None => false,
    }
}

fn record_exit(
    caller: &mut Caller<'_, HookInvocation>,
    exit_type: ExitType,
    code: i64,
    reason_ptr: u32,
    reason_len: u32,
) -> Result<i64, wasmi::Error> {
    let Some((memory, state)) = memory_and_state(caller) else {
        return Ok(INTERNAL_ERROR);
    };
    let mut reason = Vec::new();
    if reason_len > 0 {
        if !in_bounds(memory.len(), reason_ptr, reason_len) {
            return Ok(OUT_OF_BOUNDS);
        }
        reason = memory[reason_ptr as usize..(reason_ptr + reason_len) as usize].to_vec();
    }
    state.exit = Some(Exit {
        exit_type,
        code,
        reason,
    });
    Err(wasmi::Error::host(HookExit))
}

fn link_host_functions(linker: &mut Linker<HookInvocation>) -> Result<(), TxError> {
    let link_err = |e: wasmi::errors::LinkerError| TxError::HookEngine(format!("linker: {e}"));

    linker
        .func_wrap(
            HOST_MODULE,
            "set_state",
            |mut caller: Caller<'_, HookInvocation>,
             key_ptr: u32,
             data_ptr: u32,
             data_len: u32|
             -> Result<i64, wasmi::Error> {
                let Some((memory, state)) = memory_and_state(&mut caller) else {
                    return Ok(INTERNAL_ERROR);
                };
                if !in_bounds(memory.len(), key_ptr, 32)
                    || !in_bounds(memory.len(), data_ptr, data_len)
                {
                    return Ok(OUT_OF_BOUNDS);
                }
                if data_len > state.data_max_size {
                    return Ok(TOO_BIG);
                }

                let mut key = [0u8; 32];
                key.copy_from_slice(&memory[key_ptr as usize..key_ptr as usize + 32]);
                let key = Hash256::from_bytes(key);

                if data_len == 0 {
                    // Deleting what does not exist is a successful no-op.
                    if state.buffer.get(&key).is_some() {
                        state.buffer.stage(key, Vec::new());
                    }
                    return Ok(0);
                }

                let data =
                    memory[data_ptr as usize..(data_ptr + data_len) as usize].to_vec();
                state.buffer.stage(key, data);
                Ok(data_len as i64)
            },
        )
        .map_err(link_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "get_state",
            |mut caller: Caller<'_, HookInvocation>,
             key_ptr: u32,
             out_ptr: u32,
             out_len: u32|
             -> Result<i64, wasmi::Error> {
                let Some((memory, state)) = memory_and_state(&mut caller) else {
                    return Ok(INTERNAL_ERROR);
                };
                if !in_bounds(memory.len(), key_ptr, 32)
                    || !in_bounds(memory.len(), out_ptr, out_len)
                {
                    return Ok(OUT_OF_BOUNDS);
                }

                let mut key = [0u8; 32];
                key.copy_from_slice(&memory[key_ptr as usize..key_ptr as usize + 32]);
                let key = Hash256::from_bytes(key);

                let Some(data) = state.buffer.get(&key) else {
                    return Ok(DOESNT_EXIST);
                };
                let written = data.len().min(out_len as usize);
                let copied = data[..written].to_vec();
                memory[out_ptr as usize..out_ptr as usize + written]
                    .copy_from_slice(&copied);
                Ok(written as i64)
            },
        )
        .map_err(link_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "accept",
            |mut caller: Caller<'_, HookInvocation>,
             code: i64,
             reason_ptr: u32,
             reason_len: u32| {
                record_exit(&mut caller, ExitType::Accept, code, reason_ptr, reason_len)
            },
        )
        .map_err(link_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "reject",
            |mut caller: Caller<'_, HookInvocation>,
             code: i64,
             reason_ptr: u32,
             reason_len: u32| {
                record_exit(&mut caller, ExitType::Reject, code, reason_ptr, reason_len)
            },
        )
        .map_err(link_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "rollback",
            |mut caller: Caller<'_, HookInvocation>,
             code: i64,
             reason_ptr: u32,
             reason_len: u32| {
                record_exit(&mut caller, ExitType::Rollback, code, reason_ptr, reason_len)
            },
        )
        .map_err(link_err)?;

    linker
        .func_wrap(
            HOST_MODULE,
            "output_dbg",
            |mut caller: Caller<'_, HookInvocation>, ptr: u32, len: u32| -> Result<i64, wasmi::Error> {
                let Some((memory, _state)) = memory_and_state(&mut caller) else {
                    return Ok(INTERNAL_ERROR);
                };
                let len = len.min(OUTPUT_DBG_MAX);
                if !in_bounds(memory.len(), ptr, len) {
                    return Ok(OUT_OF_BOUNDS);
                }
                let text = String::from_utf8_lossy(
                    &memory[ptr as usize..(ptr + len) as usize],
                )
                .into_owned();
                tracing::debug!(target: "hook", "{text}");
                Ok(len as i64)
            },
        )
        .map_err(link_err)?;

    Ok(())
}
