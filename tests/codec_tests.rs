use std::slice;
use std::sync::Arc;

use sdrbridge::codec::{decode_arg_info_list, decode_kwargs, decode_kwargs_list, decode_ranges, HostArgs, HostArgsList};
use sdrbridge::native::{SimDeviceSpec, SimulatedLibrary};
use sdrbridge::{Api, ArgInfo, ArgOption, ArgType, Args, DeviceHandle, NativeApi, Range};

fn numbered_args(n: usize) -> Args {
    (0..n).map(|i| (format!("key{}", i), format!("value {}", i))).collect()
}

fn descriptor(index: usize, num_options: usize) -> ArgInfo {
    ArgInfo {
        key: format!("arg{}", index),
        value: "0".to_string(),
        name: if index % 2 == 0 { format!("Arg {}", index) } else { String::new() },
        description: "test descriptor".to_string(),
        units: "dB".to_string(),
        arg_type: if num_options == 0 { ArgType::Float } else { ArgType::String },
        range: (num_options == 0).then(|| Range::new(-10.0, 10.0, 0.5)),
        options: (0..num_options)
            .map(|o| ArgOption {
                value: format!("v{}", o),
                name: format!("Option {}", o),
            })
            .collect(),
    }
}

#[test]
fn test_native_kwargs_decode_and_clear_leave_no_blocks() {
    let lib = SimulatedLibrary::new();

    for n in 0..=16 {
        let expected = numbered_args(n);
        let mut raw = lib.heap().alloc_kwargs(&expected);

        let decoded = unsafe { decode_kwargs(&raw) };
        assert_eq!(decoded, expected);

        unsafe { lib.kwargs_clear(&mut raw) };
        assert_eq!(raw.size, 0);
        assert_eq!(lib.heap().live_blocks(), 0, "n = {}", n);
    }
    assert_eq!(lib.heap().invalid_frees(), 0);
}

#[test]
fn test_host_args_round_trip_every_size() {
    for n in 0..=16 {
        let map = numbered_args(n);
        assert_eq!(map.len(), n);
        let encoded = HostArgs::encode(Some(&map)).unwrap();

        assert_eq!(encoded.len(), n);
        assert_eq!(encoded.decode(), Some(map.clone()));
        if n > 0 {
            // What the native side sees through the pointer
            let raw = unsafe { decode_kwargs(&*encoded.as_ptr()) };
            assert_eq!(raw, map, "n = {}", n);
        }
    }
}

#[test]
fn test_host_args_list_keeps_empty_entry() {
    let list = vec![numbered_args(3), Args::new(), numbered_args(16)];
    let encoded = HostArgsList::encode(&list).unwrap();
    assert_eq!(encoded.len(), 3);
    assert_eq!(encoded.decode(), list);

    let raw = unsafe { slice::from_raw_parts(encoded.as_ptr(), encoded.len()) };
    assert_eq!(raw[1].size, 0);
    assert_eq!(raw[2].size, 16);
    assert_eq!(unsafe { decode_kwargs_list(raw) }, list);
}

#[test]
fn test_native_kwargs_list_keeps_order() {
    let lib = SimulatedLibrary::new();
    let list = vec![numbered_args(2), Args::new(), numbered_args(1)];

    let ptr = lib.heap().alloc_kwargs_list(&list);
    let decoded = unsafe { decode_kwargs_list(slice::from_raw_parts(ptr, list.len())) };
    assert_eq!(decoded, list);

    unsafe { lib.kwargs_list_clear(ptr, list.len()) };
    assert_eq!(lib.heap().live_blocks(), 0);
    assert_eq!(lib.heap().invalid_frees(), 0);
}

#[test]
fn test_arg_info_list_with_varied_options() {
    let lib = SimulatedLibrary::new();
    let infos: Vec<ArgInfo> = (0..5).map(|i| descriptor(i, i % 4)).collect();

    let ptr = lib.heap().alloc_arg_info_list(&infos);
    let decoded = unsafe { decode_arg_info_list(slice::from_raw_parts(ptr, infos.len())) };
    unsafe { lib.arg_info_list_clear(ptr, infos.len()) };

    assert_eq!(decoded, infos);
    for info in &decoded {
        for (i, option) in info.options.iter().enumerate() {
            assert_eq!(option.value, format!("v{}", i));
            assert_eq!(option.name, format!("Option {}", i));
        }
    }
    assert_eq!(decoded[1].display_name(), "arg1");
    assert_eq!(lib.heap().live_blocks(), 0);
    assert_eq!(lib.heap().invalid_frees(), 0);
}

#[test]
fn test_ranges_are_copied_exactly() {
    let lib = SimulatedLibrary::new();
    let ranges = vec![Range::new(0.1, 0.3, 0.0), Range::new(1e9, 6e9, 1e3)];

    let ptr = lib.heap().alloc_ranges(&ranges);
    let decoded = decode_ranges(unsafe { slice::from_raw_parts(ptr, ranges.len()) });
    unsafe { lib.free(ptr.cast()) };

    assert_eq!(decoded, ranges);
    assert_eq!(lib.heap().live_blocks(), 0);
}

#[test]
fn test_host_args_absent_and_empty() {
    let absent = HostArgs::encode(None).unwrap();
    let empty = HostArgs::encode(Some(&Args::new())).unwrap();

    assert!(!absent.is_present());
    assert!(empty.is_present());
    assert!(empty.is_empty());
    assert_eq!(absent.decode(), None);
    assert_eq!(empty.decode(), Some(Args::new()));
}

#[test]
fn test_enumerate_releases_native_results() {
    let lib = Arc::new(
        SimulatedLibrary::new()
            .with_device(SimDeviceSpec::new("0001"))
            .with_device(SimDeviceSpec::new("0002")),
    );
    let api: Api = lib.clone();

    assert_eq!(DeviceHandle::enumerate(&api, None).unwrap().len(), 2);
    assert_eq!(DeviceHandle::enumerate(&api, Some(&Args::new())).unwrap().len(), 2);

    let found = DeviceHandle::enumerate_str(&api, "serial=0002").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["serial"], "0002");
    assert_eq!(found[0]["driver"], "sim");

    assert!(DeviceHandle::enumerate_str(&api, "driver=uhd").unwrap().is_empty());
    assert_eq!(lib.heap().live_blocks(), 0);
}
