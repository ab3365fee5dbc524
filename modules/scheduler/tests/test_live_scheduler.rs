// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use algorithm::{fusion::MeanFusion, nmea::DialectKind};
use common::{
    channel::ChannelId,
    clock::Clock,
    error::NavError,
    position::FusedFix,
    test_helper::{fix::base_time, manual_clock::ManualClock},
};
use gnss::{
    channel::ReceiverChannel,
    serial_source::SerialConfig,
    source::LineSource,
    test_helper::{ScriptProbe, ScriptStep, ScriptedSource},
};
use module_core::{
    EventBus, EventKind, EventKindType, Module, ModuleCtx, payload_ref,
    test_helper::{collect_events, stop_module, wait_for_event},
};
use scheduler::{
    config::ChannelConfig,
    live::{LiveScheduler, open_channels},
};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use storage::FixStore;

const READ_TIMEOUT: Duration = Duration::from_millis(10);
const PERIOD: Duration = Duration::from_millis(20);
const EVENT_TIMEOUT: Duration = Duration::from_millis(500);

fn setup_empty_test_folder(test_name: &str) -> PathBuf {
    let path = PathBuf::from("/tmp/oval-nav/scheduler").join(test_name);
    if path.exists() {
        std::fs::remove_dir_all(&path).unwrap();
    }
    std::fs::create_dir_all(&path).unwrap();
    path
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(base_time()))
}

async fn create_channel(
    store: &FixStore,
    id: ChannelId,
    dialect: DialectKind,
    lines: &[&str],
) -> (ReceiverChannel, ScriptProbe) {
    let source = ScriptedSource::from_lines(&format!("scripted {id}"), lines, READ_TIMEOUT);
    let probe = source.probe();
    let channel = ReceiverChannel::new(
        id,
        Box::new(source),
        dialect.dialect(),
        store.open_writer(id).await.unwrap(),
        clock(),
    );
    (channel, probe)
}

fn start_module(
    ctx: ModuleCtx,
    channels: Vec<ReceiverChannel>,
) -> tokio::task::JoinHandle<Result<(), ()>> {
    tokio::spawn(async move {
        let mut scheduler = LiveScheduler::new(ctx, channels, Box::new(MeanFusion), PERIOD);
        scheduler.run().await
    })
}

fn fused(event: &module_core::Event) -> FusedFix {
    **payload_ref!(event.kind, EventKind::FusedFixEvent).unwrap()
}

fn channel_config(id: ChannelId, path: &str, init_sentences: &[&str]) -> ChannelConfig {
    ChannelConfig {
        id,
        serial: SerialConfig {
            path: path.to_owned(),
            baud_rate: 115200,
            read_timeout: READ_TIMEOUT,
            write_timeout: READ_TIMEOUT,
        },
        dialect: DialectKind::Gprmc,
        init_sentences: init_sentences.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
#[test_log::test]
async fn fuse_mean_of_both_channels() {
    let store = FixStore::new(&setup_empty_test_folder("fuse_mean_of_both_channels")).unwrap();
    let (a, _) = create_channel(
        &store,
        ChannelId::A,
        DialectKind::Gprmc,
        &["$GPRMC,,,4000.000,N,1130.000,E,,090.0,,,,"],
    )
    .await;
    let (b, _) = create_channel(
        &store,
        ChannelId::B,
        DialectKind::Gnrmc,
        &["$GNRMC,,,4001.200,N,1130.000,E,,,,,,"],
    )
    .await;
    let event_bus = EventBus::default();
    let mut receiver = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![a, b]);

    let event = wait_for_event(&mut receiver, EVENT_TIMEOUT, EventKindType::FusedFixEvent).await;

    let fix = fused(&event);
    assert!((fix.latitude - 40.01).abs() < 1e-9);
    assert_eq!(fix.longitude, 11.5);
    assert_eq!(fix.heading, Some(90.0));
    stop_module(&event_bus, &mut module_handle).await;
    assert_eq!(store.read_all(ChannelId::A).await.unwrap().len(), 1);
    assert_eq!(store.read_all(ChannelId::B).await.unwrap().len(), 1);
}

#[tokio::test]
#[test_log::test]
async fn forward_single_channel_fix_verbatim() {
    let store =
        FixStore::new(&setup_empty_test_folder("forward_single_channel_fix_verbatim")).unwrap();
    let (a, _) = create_channel(
        &store,
        ChannelId::A,
        DialectKind::Gprmc,
        &["$GPRMC,,,0740000,N,01220000,E,,,,,,"],
    )
    .await;
    let (b, _) = create_channel(&store, ChannelId::B, DialectKind::Gnrmc, &[]).await;
    let event_bus = EventBus::default();
    let mut receiver = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![a, b]);

    let event = wait_for_event(&mut receiver, EVENT_TIMEOUT, EventKindType::FusedFixEvent).await;

    let persisted = store.read_all(ChannelId::A).await.unwrap();
    assert_eq!(fused(&event), FusedFix::from(persisted[0]));
    assert_eq!(fused(&event).as_wire(), [-74.0, -122.0, 0.0]);
    stop_module(&event_bus, &mut module_handle).await;
}

#[tokio::test]
#[test_log::test]
async fn announce_accepted_channel_fixes() {
    let store = FixStore::new(&setup_empty_test_folder("announce_accepted_channel_fixes")).unwrap();
    let (b, _) = create_channel(
        &store,
        ChannelId::B,
        DialectKind::Gnrmc,
        &["$GNRMC,,,4001.200,N,1130.000,E,,,,,,"],
    )
    .await;
    let event_bus = EventBus::default();
    let mut receiver = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![b]);

    let event = wait_for_event(&mut receiver, EVENT_TIMEOUT, EventKindType::ChannelFixEvent).await;

    let channel_fix = payload_ref!(event.kind, EventKind::ChannelFixEvent).unwrap();
    assert_eq!(channel_fix.channel, ChannelId::B);
    assert_eq!(
        store.read_all(ChannelId::B).await.unwrap(),
        vec![channel_fix.fix]
    );
    stop_module(&event_bus, &mut module_handle).await;
}

#[tokio::test]
#[test_log::test]
async fn publish_nothing_without_fix() {
    let store = FixStore::new(&setup_empty_test_folder("publish_nothing_without_fix")).unwrap();
    let (a, _) = create_channel(
        &store,
        ChannelId::A,
        DialectKind::Gprmc,
        &["$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9", "no sentence"],
    )
    .await;
    let (b, _) = create_channel(&store, ChannelId::B, DialectKind::Gnrmc, &[]).await;
    let event_bus = EventBus::default();
    let mut receiver = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![a, b]);

    let events = collect_events(
        &mut receiver,
        PERIOD * 8,
        EventKindType::FusedFixEvent,
    )
    .await;

    assert!(events.is_empty());
    stop_module(&event_bus, &mut module_handle).await;
}

#[tokio::test]
#[test_log::test]
async fn run_cycles_at_the_configured_rate() {
    let store =
        FixStore::new(&setup_empty_test_folder("run_cycles_at_the_configured_rate")).unwrap();
    let lines = vec!["$GPRMC,,,4000.000,N,1130.000,E,,,,,,"; 50];
    let (a, _) = create_channel(&store, ChannelId::A, DialectKind::Gprmc, &lines).await;
    let event_bus = EventBus::default();
    let mut receiver = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![a]);

    let events = collect_events(
        &mut receiver,
        PERIOD * 5 + PERIOD / 2,
        EventKindType::FusedFixEvent,
    )
    .await;

    assert!(
        (3..=7).contains(&events.len()),
        "{} cycles in 5.5 periods",
        events.len()
    );
    stop_module(&event_bus, &mut module_handle).await;
}

#[tokio::test]
#[test_log::test]
async fn keep_running_on_persistence_failure() {
    let path = setup_empty_test_folder("keep_running_on_persistence_failure");
    let store = FixStore::new(&path).unwrap();
    std::os::unix::fs::symlink("/dev/full", store.log_path(ChannelId::A)).unwrap();
    let (a, _) = create_channel(
        &store,
        ChannelId::A,
        DialectKind::Gprmc,
        &["$GPRMC,,,4000.000,N,1130.000,E,,,,,,"],
    )
    .await;
    let event_bus = EventBus::default();
    let mut failures = event_bus.subscribe();
    let mut fixes = event_bus.subscribe();
    let mut module_handle = start_module(event_bus.context(), vec![a]);

    let failure = wait_for_event(
        &mut failures,
        EVENT_TIMEOUT,
        EventKindType::PersistenceFailureEvent,
    )
    .await;
    let fix = wait_for_event(&mut fixes, EVENT_TIMEOUT, EventKindType::FusedFixEvent).await;

    assert_eq!(
        payload_ref!(failure.kind, EventKind::PersistenceFailureEvent),
        Some(&ChannelId::A)
    );
    assert_eq!(fused(&fix).latitude, 40.0);
    stop_module(&event_bus, &mut module_handle).await;
}

#[tokio::test]
#[test_log::test]
async fn close_devices_on_quit() {
    let store = FixStore::new(&setup_empty_test_folder("close_devices_on_quit")).unwrap();
    let source = ScriptedSource::new("silent", vec![ScriptStep::Silence], Duration::from_secs(10));
    let probe = source.probe();
    let channel = ReceiverChannel::new(
        ChannelId::A,
        Box::new(source),
        DialectKind::Gprmc.dialect(),
        store.open_writer(ChannelId::A).await.unwrap(),
        clock(),
    );
    let event_bus = EventBus::default();
    let mut module_handle = start_module(event_bus.context(), vec![channel]);
    tokio::time::sleep(PERIOD).await;

    stop_module(&event_bus, &mut module_handle).await;

    assert!(probe.is_closed());
}

#[tokio::test]
#[test_log::test]
async fn open_remaining_channel_when_one_device_is_missing() {
    let store = FixStore::new(&setup_empty_test_folder(
        "open_remaining_channel_when_one_device_is_missing",
    ))
    .unwrap();
    let probes = Mutex::new(vec![]);
    let configs = [
        channel_config(ChannelId::A, "/dev/missing", &[]),
        channel_config(ChannelId::B, "/dev/present", &["$PMTK220,100*2F"]),
    ];

    let channels = open_channels(&configs, &store, clock(), |serial| {
        if serial.path == "/dev/missing" {
            return Err(NavError::DeviceUnavailable {
                path: serial.path.clone(),
                reason: "No such file or directory".to_owned(),
            });
        }
        let source = ScriptedSource::new(&serial.path, vec![], serial.read_timeout);
        probes.lock().unwrap().push(source.probe());
        Ok(Box::new(source) as Box<dyn LineSource>)
    })
    .await
    .unwrap();

    assert_eq!(
        channels.iter().map(ReceiverChannel::id).collect::<Vec<_>>(),
        vec![ChannelId::B]
    );
    let probes = probes.into_inner().unwrap();
    assert_eq!(probes.len(), 1);
    assert_eq!(probes[0].written(), vec!["$PMTK220,100*2F".to_owned()]);
}

#[tokio::test]
#[test_log::test]
async fn fail_startup_without_any_device() {
    let store =
        FixStore::new(&setup_empty_test_folder("fail_startup_without_any_device")).unwrap();
    let configs = [
        channel_config(ChannelId::A, "/dev/missing_a", &[]),
        channel_config(ChannelId::B, "/dev/missing_b", &[]),
    ];

    let result = open_channels(&configs, &store, clock(), |serial| {
        Err(NavError::DeviceUnavailable {
            path: serial.path.clone(),
            reason: "No such file or directory".to_owned(),
        })
    })
    .await;

    assert!(matches!(
        result,
        Err(NavError::DeviceUnavailable { path, .. }) if path == "/dev/missing_b"
    ));
}
