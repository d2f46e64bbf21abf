use std::io::Write;

use wirescene::channels::ChannelKind;
use wirescene::prelude::*;
use wirescene::parse_document;

const JCAS_LINK: &str = include_str!("fixtures/jcas_link.yml");

#[test]
fn shared_device_is_one_entity() {
    let scenario = Scenario::from_yaml(
        "
devices:
  A: !SimulatedDevice { carrier_frequency: 1e9 }
  B: !SimulatedDevice { carrier_frequency: 1e9 }
channels:
  - !Channel { devices: [A, B] }
operators:
  estimator: !ReceivingModem
    device: A
    reference: B
    waveform: !SC-Rectangular { symbol_rate: 1e6 }
",
    )
    .unwrap();

    let (_, channel) = scenario.channels().next().unwrap();
    let operator = scenario.operator(scenario.operator_id("estimator").unwrap());

    assert_eq!(operator.device, channel.devices[0]);
    assert_eq!(operator.reference, Some(channel.devices[1]));
    assert_eq!(scenario.device(operator.device).alias, "A");
    assert_eq!(scenario.devices().count(), 2);
}

#[test]
fn fixture_resolves_completely() {
    let scenario = Scenario::from_yaml(JCAS_LINK).unwrap();
    let base_station = scenario.device_id("base_station").unwrap();
    let terminal = scenario.device_id("terminal").unwrap();

    // *base_station and the plain alias name the same device
    let sensing = scenario.channel(scenario.channel_id("sensing").unwrap());
    assert_eq!(sensing.devices, [base_station, base_station]);

    let jcas = scenario.operator_id("jcas").unwrap();
    let rx = scenario.operator(scenario.operator_id("rx").unwrap());
    assert_eq!(rx.device, terminal);
    assert_eq!(rx.reference, Some(base_station));

    assert_eq!(scenario.evaluators().len(), 3);
    assert_eq!(
        scenario.evaluators()[2].subjects,
        Subjects::Sensing {
            radar: jcas,
            channel: scenario.channel_id("sensing"),
        }
    );
    assert!(scenario.unused_devices().is_empty());
    assert_eq!(scenario.sweep().num_points(), 11 * 4);
    assert_eq!(scenario.settings().seed, Some(42));
}

#[test]
fn descending_ellipsis_dimension() {
    let scenario = Scenario::from_yaml(JCAS_LINK).unwrap();
    let snr = &scenario.dimensions()[0];
    assert_eq!(snr.path, "snr");
    assert_eq!(snr.unit, Unit::Decibel);
    assert_eq!(snr.values, vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0, -2.0, -4.0, -6.0, -8.0, -10.0]);
}

#[test]
fn undeclared_alias_is_named_in_error() {
    let err = Scenario::from_yaml(
        "
devices:
  A: !SimulatedDevice { carrier_frequency: 1e9 }
channels:
  - !Channel { devices: [A, Ghost] }
",
    )
    .unwrap_err();

    match &err {
        ScenarioError::UnresolvedReference { alias, location, .. } => {
            assert_eq!(alias, "Ghost");
            assert_eq!(location, "channels[0].devices[1]");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn unknown_tag_names_tag_and_closed_set() {
    let err = Scenario::from_yaml("devices:\n  A: !SimulatedDevise { carrier_frequency: 1e9 }\n").unwrap_err();

    match &err {
        ScenarioError::Schema { tag, expected, location, .. } => {
            assert_eq!(tag, "SimulatedDevise");
            assert_eq!(*expected, &["SimulatedDevice"]);
            assert_eq!(location, "devices.A");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("!SimulatedDevise"));
    assert!(message.contains("SimulatedDevice"));
}

#[test]
fn unknown_channel_tag_lists_every_model() {
    let err = Scenario::from_yaml("channels:\n  - !Teleport { devices: [a, b] }\n").unwrap_err();
    let ScenarioError::Schema { expected, .. } = err else {
        panic!("expected a schema error");
    };
    assert!(expected.contains(&"RadarChannel"));
    assert!(expected.contains(&"5GTDL"));
}

#[test]
fn missing_field_reports_location() {
    let err = Scenario::from_yaml(
        "devices:\n  A: !SimulatedDevice { carrier_frequency: 1e9 }\nchannels:\n  - !Channel { devices: [A, A] }\n  - !RadarChannel { devices: [A, A], target_range: 10 }\n",
    )
    .unwrap_err();
    match err {
        ScenarioError::MissingField { location, field } => {
            assert_eq!(location, "channels[1]");
            assert_eq!(field, "radar_cross_section");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn forward_references_resolve() {
    let scenario = Scenario::from_yaml(
        "
evaluators:
  - !FrameErrorEvaluator { transmitting_modem: modem, receiving_modem: modem }
operators:
  modem: !Modem
    device: later
    waveform: !SC-Gaussian { symbol_rate: 1e6 }
channels:
  - !Channel { devices: [later, later] }
devices:
  later: !SimulatedDevice { carrier_frequency: 2.4e9 }
",
    )
    .unwrap();
    let later = scenario.device_id("later").unwrap();
    assert_eq!(scenario.operator(scenario.operator_id("modem").unwrap()).device, later);
}

#[test]
fn resolving_twice_is_identical() {
    let document = parse_document(JCAS_LINK).unwrap();
    assert_eq!(document.resolve().unwrap(), document.resolve().unwrap());
}

#[test]
fn round_trip_preserves_graph() {
    let scenario = Scenario::from_yaml(JCAS_LINK).unwrap();
    let yaml = scenario.to_yaml().unwrap();
    let reparsed = Scenario::from_yaml(&yaml).unwrap();

    assert_eq!(reparsed, scenario);
    for alias in ["base_station", "terminal", "sensing", "jcas", "rx"] {
        assert_eq!(reparsed.lookup(alias), scenario.lookup(alias), "alias {alias}");
    }
}

#[test]
fn normalized_document_fills_defaults() {
    let scenario = Scenario::from_yaml(
        "devices:\n  A: !SimulatedDevice { carrier_frequency: 1e9 }\nchannels:\n  - !Channel { devices: [A, A] }\n",
    )
    .unwrap();
    let value = scenario.to_value();
    assert_eq!(value["simulation"]["num_samples"].as_u64(), Some(100));
    assert!(scenario.to_yaml().unwrap().contains("gain: 1.0"));

    let ChannelKind::Ideal { gain } = scenario.channel(scenario.channels().next().unwrap().0).kind else {
        panic!("expected the trivial channel");
    };
    assert_eq!(gain, 1.0);
}

#[test]
fn load_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(JCAS_LINK.as_bytes()).unwrap();

    let scenario = Scenario::load(file.path()).unwrap();
    assert_eq!(scenario.name(), "jcas_link");
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yml");

    let err = Scenario::load(&path).unwrap_err();
    assert!(matches!(err, ScenarioError::Io { path: ref p, .. } if *p == path));
    assert!(err.location().is_none());
}

#[test]
fn grid_export_writes_one_row_per_point() {
    let scenario = Scenario::from_yaml(JCAS_LINK).unwrap();
    let mut logger = wirescene::sweep::export::GridLogger::from_writer(Vec::new());
    let rows = logger.log_sweep(scenario.sweep()).unwrap();
    let csv = String::from_utf8(logger.into_inner().unwrap()).unwrap();

    assert_eq!(rows, 44);
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("index,snr [dB],sensing.target_range"));
    assert_eq!(lines.next(), Some("0,10,10"));
    assert_eq!(lines.next(), Some("1,10,20"));
    assert_eq!(csv.lines().count(), 45);
}

#[test]
fn equal_devices_behind_anchors_stay_distinct() {
    let scenario = Scenario::from_yaml(
        "
devices:
  base_station: &base_station !SimulatedDevice { carrier_frequency: 60e9 }
  terminal: &terminal !SimulatedDevice { carrier_frequency: 60e9 }
channels:
  - !Channel { devices: [*base_station, *terminal] }
operators:
  rx: !ReceivingModem
    device: *terminal
    reference: *base_station
    waveform: !SC-Rectangular { symbol_rate: 1e6 }
",
    )
    .unwrap();

    let base_station = scenario.device_id("base_station").unwrap();
    let terminal = scenario.device_id("terminal").unwrap();
    let (_, channel) = scenario.channels().next().unwrap();
    assert_eq!(channel.devices, [base_station, terminal]);

    let rx = scenario.operator(scenario.operator_id("rx").unwrap());
    assert_eq!(rx.device, terminal);
    assert_eq!(rx.reference, Some(base_station));
}

#[test]
fn unused_devices_are_reported() {
    let scenario = Scenario::from_yaml(
        "
devices:
  used: !SimulatedDevice { carrier_frequency: 1e9 }
  spare: !SimulatedDevice { carrier_frequency: 1e9 }
  reference_only: !SimulatedDevice { carrier_frequency: 1e9 }
  idle: !SimulatedDevice { carrier_frequency: 2e9 }
channels:
  - !Channel { devices: [used, used] }
operators:
  rx: !ReceivingModem
    device: used
    reference: reference_only
    waveform: !SC-Rectangular { symbol_rate: 1e6 }
",
    )
    .unwrap();

    let unused: Vec<&str> = scenario
        .unused_devices()
        .into_iter()
        .map(|id| scenario.device(id).alias.as_str())
        .collect();
    assert_eq!(unused, vec!["spare", "idle"]);
}

#[test]
fn remaining_models_survive_round_trip() {
    let scenario = Scenario::from_yaml(
        "
name: coverage
devices:
  bs: !SimulatedDevice { carrier_frequency: 3.5e9, num_antennas: 4 }
  ue: !SimulatedDevice { carrier_frequency: 3.5e9 }
channels:
  - !COST256 { alias: rural, devices: [bs, ue], model_type: RURAL_AREA, doppler_frequency: 10, los_angle: 0.5 }
  - !COST256 { devices: [ue, bs], model_type: HILLY }
  - !ClusterDelayLine
    devices: [bs, bs]
    num_clusters: 12
    delay_spread: 1e-7
    delay_scaling: 2.5
    rice_factor_mean: 3
operators:
  quiet: !SilentTransmitter { device: ue, num_samples: 256, sampling_rate: 1e6 }
  dl: !Modem
    device: bs
    waveform: !SC-RootRaisedCosine { symbol_rate: 1e6 }
    beamformer: !ConventionalBeamformer {}
    precoding: !SymbolCoding [!ZF {}]
  ul: !ReceivingModem
    device: bs
    reference: ue
    waveform: !SC-RootRaisedCosine { symbol_rate: 1e6 }
    beamformer: !CaponBeamformer { loading: 1e-4 }
dimensions:
  snr: { values: [0, 3, 6], unit: dB }
  rural.doppler_frequency: { start: 0, stop: 100, step: 50 }
",
    )
    .unwrap();

    let yaml = scenario.to_yaml().unwrap();
    assert!(yaml.contains("!SilentTransmitter"));
    assert!(yaml.contains("!ClusterDelayLine"));
    assert!(yaml.contains("!CaponBeamformer"));

    let reparsed = Scenario::from_yaml(&yaml).unwrap();
    assert_eq!(reparsed, scenario);
    assert_eq!(reparsed.dimensions()[0].unit, Unit::Decibel);
    assert_eq!(reparsed.dimensions()[0].values, vec![0.0, 3.0, 6.0]);
    assert_eq!(reparsed.sweep().num_points(), 9);

    let dl = reparsed.operator(reparsed.operator_id("dl").unwrap());
    assert_eq!(dl.beamformer, Some(Beamformer::Conventional));
    assert_eq!(dl.precoding.as_ref().map(|p| p.precoders().len()), Some(1));
}

#[test]
fn oversized_sweep_fails_to_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut text = String::from("dimensions:\n");
    for name in ["a", "b", "c", "d"] {
        text.push_str(&format!("  {name}: [0, 1, ..., 99999]\n"));
    }
    file.write_all(text.as_bytes()).unwrap();

    let err = Scenario::load(file.path()).unwrap_err();
    assert!(matches!(err, ScenarioError::TypeMismatch { ref location, .. } if location == "dimensions.b"));
}
