use honggfuzz::fuzz;
use raster_packer_fuzz::{run_protocol, Call};

fn main() {
    loop {
        fuzz!(|calls: Vec<Call>| {
            run_protocol(&calls);
        });
    }
}
