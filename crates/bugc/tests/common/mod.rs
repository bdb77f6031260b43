//! Shared harness: compiles BUG programs and runs them on revm.

#![allow(dead_code)]

use bugc::{
    Artifacts, Generated, Input, Output, compile,
    config::{CompilerStage, OptLevel},
};
use revm::{
    Database, Evm,
    db::{CacheDB, EmptyDB},
    primitives::{Address, Bytes, ExecutionResult, Output as EvmOutput, TxKind, U256},
};

pub const LEVELS: [OptLevel; 4] = [OptLevel::O0, OptLevel::O1, OptLevel::O2, OptLevel::O3];

pub const CALLER: Address = Address::with_last_byte(0xca);

const GAS_LIMIT: u64 = 30_000_000;

/// Installs a test logger once; `RUST_LOG` selects what is printed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Compiles `src` to bytecode, panicking with the diagnostics on failure.
pub fn compile_ok(src: &str, level: OptLevel) -> Artifacts<Generated> {
    init_tracing();
    match compile(Input::new(src).with_level(level), CompilerStage::Bytecode) {
        Ok(Output::Bytecode(artifacts)) => artifacts,
        Ok(output) => panic!("stopped at {}", output.stage()),
        Err(diagnostics) => panic!("compilation failed at {level}:\n{diagnostics}"),
    }
}

/// A deployed contract.
pub struct Contract {
    evm: Evm<'static, (), CacheDB<EmptyDB>>,
    pub address: Address,
}

impl Contract {
    /// Compiles and deploys `src`, running its `create` block.
    pub fn deploy(src: &str, level: OptLevel) -> Self {
        let init = compile_ok(src, level).stage.deployment_code();
        let mut evm = Evm::builder()
            .with_db(CacheDB::new(EmptyDB::default()))
            .modify_tx_env(|tx| {
                tx.caller = CALLER;
                tx.gas_limit = GAS_LIMIT;
                tx.transact_to = TxKind::Create;
                tx.data = Bytes::from(init);
            })
            .build();
        let result = evm.transact_commit().unwrap();
        let ExecutionResult::Success { output: EvmOutput::Create(_, Some(address)), .. } = result
        else {
            panic!("deployment failed at {level}: {result:?}");
        };
        Self { evm, address }
    }

    /// Calls the contract, returning its output.
    pub fn call(&mut self, calldata: &[u8]) -> Bytes {
        self.call_with_value(calldata, U256::ZERO)
    }

    pub fn call_with_value(&mut self, calldata: &[u8], value: U256) -> Bytes {
        let tx = self.evm.tx_mut();
        tx.transact_to = TxKind::Call(self.address);
        tx.data = Bytes::copy_from_slice(calldata);
        tx.value = value;
        if !value.is_zero() {
            self.fund(value);
        }
        match self.evm.transact_commit().unwrap() {
            ExecutionResult::Success { output: EvmOutput::Call(output), .. } => output,
            other => panic!("call failed: {other:?}"),
        }
    }

    /// Reads a storage slot.
    pub fn storage(&mut self, slot: U256) -> U256 {
        self.evm.db_mut().storage(self.address, slot).unwrap()
    }

    /// Reads a numbered storage slot.
    pub fn slot(&mut self, slot: u64) -> U256 {
        self.storage(U256::from(slot))
    }

    fn fund(&mut self, value: U256) {
        let db = self.evm.db_mut();
        let mut info = db.basic(CALLER).unwrap().unwrap_or_default();
        info.balance += value;
        db.insert_account_info(CALLER, info);
    }
}

/// Deploys `src` at every level, calls it once and checks the given slots.
pub fn assert_slots(src: &str, expected: &[(u64, u64)]) {
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        contract.call(&[]);
        for &(slot, value) in expected {
            assert_eq!(contract.slot(slot), U256::from(value), "slot {slot} at {level}");
        }
    }
}
