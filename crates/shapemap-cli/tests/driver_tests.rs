use super::*;
use clap::Parser;

const INPUT: &str = r#"{
  "types": [
    { "name": "Car", "members": [
        { "name": "Name", "type": "string" },
        { "name": "Vin", "type": "string" },
        { "name": "Wheel", "type": "Wheel" }
    ] },
    { "name": "CarDto", "members": [
        { "name": "Name", "type": "string" },
        { "name": "Wheel", "type": "WheelDto" }
    ] },
    { "name": "Wheel", "members": [{ "name": "Size", "type": "int" }] },
    { "name": "WheelDto", "members": [{ "name": "Size", "type": "long" }] }
  ],
  "mappers": [
    { "name": "CarMapper", "methods": [{ "name": "Map", "source": "Car", "target": "CarDto" }] },
    { "name": "BrokenMapper", "methods": [{ "name": "Map", "source": "Car", "target": "int" }] }
  ]
}"#;

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["shapemap"];
    argv.extend_from_slice(extra);
    argv.push("input.json");
    CliArgs::try_parse_from(argv).expect("args")
}

#[test]
fn test_text_report_lists_diagnostics_and_code() {
    let workspace = schema::parse(INPUT).expect("schema");
    let outcome = run_workspace(&args(&["-m", "CarMapper"]), &workspace).expect("run");

    assert!(!outcome.failed);
    assert_eq!(outcome.errors, 0);
    assert!(outcome.output.starts_with("// mapper CarMapper\n"));
    assert!(outcome.output.contains("// info SM0008:"), "{}", outcome.output);
    assert!(outcome.output.contains("(in Map)"));
    assert!(outcome.output.contains("target.Wheel = MapToWheelDto(source.Wheel);"));
    assert!(outcome.output.contains("target.Size = (long)source.Size;"));
}

#[test]
fn test_quiet_hides_info_diagnostics() {
    let workspace = schema::parse(INPUT).expect("schema");
    let outcome = run_workspace(&args(&["-q", "-m", "CarMapper"]), &workspace).expect("run");
    assert!(!outcome.output.contains("SM0008"));
}

#[test]
fn test_errors_fail_the_run() {
    let workspace = schema::parse(INPUT).expect("schema");
    let outcome = run_workspace(&args(&["--no-code"]), &workspace).expect("run");

    assert!(outcome.failed);
    assert_eq!(outcome.errors, 1);
    assert!(outcome.output.contains("// mapper BrokenMapper"));
    assert!(outcome.output.contains("error SM0001: Could not create mapping from Car to int"));
    assert!(!outcome.output.contains("CarDto Map(Car source)"));
}

#[test]
fn test_plans_listing_names_methods() {
    let workspace = schema::parse(INPUT).expect("schema");
    let outcome =
        run_workspace(&args(&["--plans", "--no-code", "-m", "CarMapper"]), &workspace).expect("run");
    assert!(outcome.output.contains("// #0 Car -> CarDto object => Map"));
    assert!(outcome.output.contains("Wheel -> WheelDto object => MapToWheelDto"));
    assert!(outcome.output.contains("int -> long implicit-cast"));
}

#[test]
fn test_json_report_shape() {
    let workspace = schema::parse(INPUT).expect("schema");
    let outcome = run_workspace(&args(&["--format", "json"]), &workspace).expect("run");
    let value: Value = serde_json::from_str(&outcome.output).expect("json");

    let mappers = value["mappers"].as_array().expect("mappers");
    assert_eq!(mappers.len(), 2);
    assert_eq!(mappers[0]["mapper"], "CarMapper");
    assert_eq!(mappers[0]["methods"][0]["strategy"], "object");
    assert_eq!(mappers[0]["generated"][0], "MapToWheelDto");
    assert!(mappers[0]["code"].as_str().expect("code").contains("CarDto Map(Car source)"));
    assert_eq!(mappers[1]["methods"][0]["strategy"], Value::Null);
    assert_eq!(mappers[1]["diagnostics"][0]["code"], "SM0001");
    assert_eq!(mappers[1]["diagnostics"][0]["severity"], "error");
}

#[test]
fn test_deny_warnings() {
    let input = r#"{
      "types": [
        { "name": "A", "members": [{ "name": "X", "type": "int" }] },
        { "name": "B", "members": [{ "name": "X", "type": "int" }, { "name": "Y", "type": "int" }] }
      ],
      "mappers": [{ "name": "M", "methods": [{ "name": "Map", "source": "A", "target": "B" }] }]
    }"#;
    let workspace = schema::parse(input).expect("schema");
    let lenient = run_workspace(&args(&[]), &workspace).expect("run");
    assert_eq!(lenient.warnings, 1);
    assert!(!lenient.failed);

    let strict = run_workspace(&args(&["--deny-warnings"]), &workspace).expect("run");
    assert!(strict.failed);
}

#[test]
fn test_unknown_mapper_is_an_error() {
    let workspace = schema::parse(INPUT).expect("schema");
    let err = run_workspace(&args(&["-m", "Nope"]), &workspace).expect_err("unknown mapper");
    assert!(err.to_string().contains("no mapper named `Nope`"));
}

#[test]
fn test_run_loads_the_input_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("input.json");
    std::fs::write(&path, INPUT).expect("write");
    let mut cli = args(&["--no-code"]);
    cli.input = path;
    let outcome = run(&cli).expect("run");
    assert!(outcome.output.contains("// mapper CarMapper"));
}
