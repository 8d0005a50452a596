use super::*;
use smi_access_k8s_api::{codec, ClusterTargetSelector, ClusterTrafficTargetList};

const MANIFEST: &str = "\
apiVersion: access.smi-spec.io/v1alpha1
kind: TrafficTarget
metadata:
  name: api-service-metrics
  namespace: default
selector:
  matchLabels:
    app: api
specs:
- kind: HTTPRouteGroup
  name: api-service-routes
  namespace: default
  matches:
  - metrics
";

#[test]
fn parses_convert_args() {
    let args = Args::try_parse_from([
        "smi-access",
        "convert",
        "--from",
        "yaml",
        "--to",
        "protobuf",
        "-i",
        "target.yaml",
        "-o",
        "target.pb",
    ])
    .unwrap();
    match args.command {
        Command::Convert {
            from,
            to,
            input,
            output,
        } => {
            assert_eq!(from, Encoding::Yaml);
            assert_eq!(to, Encoding::Protobuf);
            assert_eq!(input, PathBuf::from("target.yaml"));
            assert_eq!(output, PathBuf::from("target.pb"));
        }
        cmd => panic!("unexpected command: {cmd:?}"),
    }
}

#[test]
fn rejects_unknown_encoding_and_kind() {
    assert!(Args::try_parse_from(["smi-access", "check", "--from", "xml"]).is_err());
    assert!(Args::try_parse_from(["smi-access", "schema", "HTTPRouteGroup"]).is_err());
    assert!(Args::try_parse_from(["smi-access", "schema", "ClusterTrafficTarget"]).is_ok());
}

#[test]
fn converts_between_encodings() {
    let json = convert(MANIFEST.as_bytes(), Encoding::Yaml, Encoding::Json).unwrap();
    let pb = convert(&json, Encoding::Json, Encoding::Protobuf).unwrap();
    let yaml = convert(&pb, Encoding::Protobuf, Encoding::Yaml).unwrap();

    let original = codec::from_yaml::<TrafficTarget>(MANIFEST.as_bytes()).unwrap();
    assert_eq!(codec::from_yaml::<TrafficTarget>(&yaml).unwrap(), original);
}

#[test]
fn convert_rejects_unknown_kinds() {
    let err = convert(b"kind: TCPRoute\n", Encoding::Yaml, Encoding::Json).unwrap_err();
    assert!(err.to_string().contains("TCPRoute"), "{err}");
}

#[test]
fn describes_targets() {
    let obj = AccessObject::decode(MANIFEST.as_bytes(), Encoding::Yaml).unwrap();
    assert_eq!(
        describe(&obj),
        "TrafficTarget default/api-service-metrics: selector [app=api], \
         HTTPRouteGroup default/api-service-routes [metrics]\n"
    );

    let list = ClusterTrafficTargetList::new(vec![
        ClusterTrafficTarget::new("scrape")
            .with_selector(ClusterTargetSelector::not_protected())
            .with_spec(TrafficTargetSpec::tcp_route("metrics", "monitoring")),
        ClusterTrafficTarget::new("empty"),
    ]);
    assert_eq!(
        describe(&list.into()),
        "ClusterTrafficTarget scrape: selector [!protected], TCPRoute monitoring/metrics [*]\n\
         ClusterTrafficTarget empty: selector [], no specs\n"
    );
}

#[test]
fn renders_schemas() {
    let schema: serde_json::Value =
        serde_json::from_str(&schema(SchemaKind::TrafficTarget).unwrap()).unwrap();
    let properties = &schema["properties"];
    assert!(properties.get("selector").is_some(), "{schema}");
    assert!(properties.get("specs").is_some(), "{schema}");
    assert!(properties.get("metadata").is_some(), "{schema}");
}

#[test]
fn converts_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("target.yaml");
    let output = dir.path().join("target.pb");
    std::fs::write(&input, MANIFEST).unwrap();

    Command::Convert {
        from: Encoding::Yaml,
        to: Encoding::Protobuf,
        input,
        output: output.clone(),
    }
    .run()
    .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let target = codec::from_protobuf::<TrafficTarget>(&bytes).unwrap();
    assert_eq!(target.name_any(), "api-service-metrics");
    assert_eq!(target.specs[0].matches, ["metrics"]);
}
