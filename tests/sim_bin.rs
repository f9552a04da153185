use std::process::Command;

#[test]
fn sim_binary_smoke() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--bin", "sim", "--", "hunt", "random", "1", "2"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run sim binary");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("non utf8 output");
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("invalid json");
    assert!(v["winner"].is_string());
    assert_eq!(v["player_a"]["strategy"], "hunt");
    let turns = v["turns"].as_u64().expect("turns");
    let shots = v["player_a"]["shots"].as_u64().unwrap() + v["player_b"]["shots"].as_u64().unwrap();
    assert_eq!(turns, shots);
}
