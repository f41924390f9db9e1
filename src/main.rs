// This file is an example of how to use the `sentinel_vision` library.
// The main library entry point is `src/lib.rs`.

fn main() {
    println!("Sentinel Vision Engine - Example Runner");
    // In a real application, you would create a config, instantiate the
    // pipeline, and process frames from a camera feed here.
    //
    // Example:
    // let config = sentinel_vision::PipelineConfig { ... };
    // let mut pipeline = MotionPipeline::new(config).with_alert_sink(sink);
    // let frame = read_frame_from_camera()?;
    // let report = pipeline.process_frame(frame)?;
    // println!("Tracked: {:?}", report.objects);
}
