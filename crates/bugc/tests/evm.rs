//! Generated bytecode executed on revm, at every optimization level.

#![allow(unused_crate_dependencies)]

mod common;

use common::{CALLER, Contract, LEVELS, assert_slots};
use revm::primitives::{U256, keccak256};

#[test]
fn storage_arithmetic() {
    assert_slots(
        "name Sum;
         storage { [0] a: uint256; [1] b: uint256; [2] c: uint256; }
         code { a = 10; b = 20; c = a + b; }",
        &[(0, 10), (1, 20), (2, 30)],
    );
}

#[test]
fn counting_loop() {
    let src = "name Loop;
         storage { [0] counter: uint256; [1] sibling: uint256; }
         create { sibling = 99; }
         code { for (let i = 0; i < 5; i = i + 1) { counter = counter + 1; } }";
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        assert_eq!(contract.slot(1), U256::from(99), "after deployment at {level}");
        contract.call(&[]);
        assert_eq!(contract.slot(0), U256::from(5), "at {level}");
        assert_eq!(contract.slot(1), U256::from(99), "at {level}");
    }
}

#[test]
fn create_then_code() {
    let src = "name Ctor;
         storage { [0] x: uint256; }
         create { x = 7; }
         code { x = 9; }";
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        assert_eq!(contract.slot(0), U256::from(7), "after deployment at {level}");
        contract.call(&[]);
        assert_eq!(contract.slot(0), U256::from(9), "after call at {level}");
    }
}

#[test]
fn create_calls_functions() {
    let src = "name Ctor;
         define { function triple(x: uint256) -> uint256 { return x * 3; }; }
         storage { [0] x: uint256; [1] y: uint256; }
         create { x = triple(5); }
         code { y = triple(x); }";
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        assert_eq!(contract.slot(0), U256::from(15), "at {level}");
        contract.call(&[]);
        assert_eq!(contract.slot(1), U256::from(45), "at {level}");
    }
}

#[test]
fn function_calls() {
    assert_slots(
        "name Calls;
         define {
           function add(a: uint256, b: uint256) -> uint256 { return a + b; };
           function twice(x: uint256) -> uint256 { return add(x, x); };
           function bump() { count = count + 1; };
         }
         storage { [0] out: uint256; [1] count: uint256; }
         code {
           out = twice(add(2, 3));
           bump();
           bump();
         }",
        &[(0, 10), (1, 2)],
    );
}

#[test]
fn function_branches_and_loops() {
    assert_slots(
        "name Max;
         define {
           function max(a: uint256, b: uint256) -> uint256 {
             if (a > b) { return a; }
             return b;
           };
           function sum_to(n: uint256) -> uint256 {
             let total = 0;
             for (let i = 1; i <= n; i = i + 1) { total = total + i; }
             return total;
           };
         }
         storage { [0] m: uint256; [1] s: uint256; }
         code { m = max(3, 8) + max(9, 4); s = sum_to(10); }",
        &[(0, 17), (1, 55)],
    );
}

#[test]
fn mappings() {
    let src = "name Bank;
         storage { [1] balances: mapping<address, uint256>; }
         code { balances[msg.sender] = balances[msg.sender] + msg.value; }";
    let mut key = [0u8; 64];
    key[12..32].copy_from_slice(CALLER.as_slice());
    key[63] = 1;
    let slot = U256::from_be_bytes(keccak256(key).0);
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        contract.call_with_value(&[], U256::from(40));
        contract.call_with_value(&[], U256::from(2));
        assert_eq!(contract.storage(slot), U256::from(42), "at {level}");
    }
}

#[test]
fn struct_fields() {
    assert_slots(
        "name Fields;
         define { struct P { a: uint256; b: uint256; }; }
         storage { [0] p: P; [2] out: uint256; }
         code { p.a = 3; p.b = 4; out = p.a * p.b; }",
        &[(0, 3), (1, 4), (2, 12)],
    );
}

#[test]
fn fixed_arrays_of_structs() {
    assert_slots(
        "name Grid;
         define { struct P { a: uint256; b: uint256; }; }
         storage { [0] ps: array<P, 2>; [4] out: uint256; }
         code { ps[1].b = 6; ps[0].a = 1; let p = ps[1]; out = p.b + ps[0].a; }",
        &[(0, 1), (1, 0), (2, 0), (3, 6), (4, 7)],
    );
}

#[test]
fn storage_alias_rebinds() {
    assert_slots(
        "name Alias;
         define { struct P { a: uint256; b: uint256; }; }
         storage { [0] ps: array<P, 2>; [4] out: uint256; [5] flag: uint256; }
         code {
           ps[0].b = 3;
           ps[1].b = 8;
           let p = ps[0];
           if (flag == 0) { p = ps[1]; }
           out = p.b;
         }",
        &[(1, 3), (3, 8), (4, 8)],
    );
}

#[test]
fn dynamic_arrays() {
    let src = "name Dyn;
         storage { [3] xs: array<uint256>; [4] out: uint256; }
         code { xs[2] = 11; out = xs[2] + xs.length; }";
    let data = U256::from_be_bytes(keccak256(U256::from(3).to_be_bytes::<32>()).0);
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        contract.call(&[]);
        assert_eq!(contract.storage(data + U256::from(2)), U256::from(11), "at {level}");
        assert_eq!(contract.slot(4), U256::from(11), "at {level}");
    }
}

#[test]
fn memory_arrays() {
    assert_slots(
        "name Mem;
         storage { [0] out: uint256; [1] second: uint256; }
         code {
           let xs = [1, 2, 3];
           let ys = [10, 20];
           xs[1] = 5;
           out = xs[0] + xs[1] + xs[2] + ys[1];
           second = ys[0];
         }",
        &[(0, 29), (1, 10)],
    );
}

#[test]
fn break_and_continue() {
    assert_slots(
        "name Skip;
         storage { [0] sum: uint256; }
         code {
           let total = 0;
           for (let i = 0; i < 10; i = i + 1) {
             if (i == 3) { continue; }
             if (i == 6) { break; }
             total = total + i;
           }
           sum = total;
         }",
        &[(0, 12)],
    );
}

#[test]
fn nested_loops() {
    assert_slots(
        "name Nested;
         storage { [0] out: uint256; [1] steps: uint256; }
         code {
           let count = 0;
           for (let i = 0; i < 3; i = i + 1) {
             for (let j = 0; j < 4; j = j + 1) { count = count + i * j; }
           }
           out = count;
           let n = 10;
           let k = 0;
           while (n > 1) { n = n - 3; k = k + 1; }
           steps = k;
         }",
        &[(0, 18), (1, 3)],
    );
}

#[test]
fn else_if_chains() {
    let src = "name Chain;
         storage { [0] x: uint256; [1] kind: uint256; }
         code {
           if (x == 0) { kind = 1; } else if (x == 1) { kind = 2; } else { kind = 3; }
           x = x + 1;
         }";
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        let mut kinds = Vec::new();
        for _ in 0..3 {
            contract.call(&[]);
            kinds.push(contract.slot(1));
        }
        assert_eq!(kinds, [U256::from(1), U256::from(2), U256::from(3)], "at {level}");
    }
}

#[test]
fn deep_expressions_spill() {
    let mut src =
        String::from("name Deep; storage { [0] seed: uint256; [1] out: uint256; } code {");
    for k in 1..=20 {
        src.push_str(&format!(" let v{k} = seed + {k};"));
    }
    let sum = (1..=20).map(|k| format!("v{k}")).collect::<Vec<_>>().join(" + ");
    src.push_str(&format!(" out = {sum}; }}"));
    assert_slots(&src, &[(1, 210)]);
}

#[test]
fn signed_arithmetic() {
    assert_slots(
        "name Signed;
         storage { [0] q: int256; [1] neg: bool; [2] r: int256; }
         code {
           let a: int256 = -7;
           let b: int256 = 2;
           q = a / b;
           neg = a < b;
           r = a % b;
         }",
        &[(1, 1)],
    );
    for level in LEVELS {
        let mut contract = Contract::deploy(
            "name Signed;
             storage { [0] q: int256; }
             code { let a: int256 = -7; let b: int256 = 2; q = a / b; }",
            level,
        );
        contract.call(&[]);
        assert_eq!(contract.slot(0), U256::MAX - U256::from(2), "at {level}");
    }
}

#[test]
fn logic_and_comparisons() {
    assert_slots(
        "name Logic;
         storage { [0] a: bool; [1] b: bool; [2] c: bool; [3] d: bool; [4] n: uint256; }
         code {
           n = 5;
           a = n > 3 && n < 10;
           b = n >= 6 || n <= 4;
           c = !(n != 5);
           d = n > 1 && (n == 2 || n == 5);
         }",
        &[(0, 1), (1, 0), (2, 1), (3, 1), (4, 5)],
    );
}

#[test]
fn environment_and_hashing() {
    let src = "name Env;
         storage { [0] count: uint256; [1] h: bytes32; [2] size: uint256; [3] who: address; }
         code {
           count = 5;
           h = keccak256(count);
           size = msg.data.length;
           who = msg.sender;
         }";
    let hash = U256::from_be_bytes(keccak256(U256::from(5).to_be_bytes::<32>()).0);
    let mut who = [0u8; 32];
    who[12..].copy_from_slice(CALLER.as_slice());
    for level in LEVELS {
        let mut contract = Contract::deploy(src, level);
        contract.call(&[1, 2, 3, 4]);
        assert_eq!(contract.slot(1), hash, "at {level}");
        assert_eq!(contract.slot(2), U256::from(4), "at {level}");
        assert_eq!(contract.slot(3), U256::from_be_bytes(who), "at {level}");
    }
}

#[test]
fn casts_truncate() {
    assert_slots(
        "name Casts;
         storage { [0] a: uint8; [1] b: uint256; [2] n: uint256; }
         code { n = 300; a = n as uint8; b = (n as uint8) as uint256 + 1; }",
        &[(0, 44), (1, 45)],
    );
}

#[test]
fn empty_program_stops() {
    for level in LEVELS {
        let mut contract = Contract::deploy("name Empty; code {}", level);
        assert!(contract.call(&[]).is_empty());
    }
}
