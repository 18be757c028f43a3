use honggfuzz::fuzz;
use raster_packer::model::config_key::RasterConfigKey;

fn main() {
    loop {
        fuzz!(|input: &str| {
            if let Ok(key) = input.parse::<RasterConfigKey>() {
                let printed = key.to_string();
                let reparsed: RasterConfigKey = printed.parse().unwrap();
                assert_eq!(key, reparsed);
                let _ = key.bytes_per_line(u32::MAX);
            }
        });
    }
}
