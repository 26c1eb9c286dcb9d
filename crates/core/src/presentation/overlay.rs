/// Size of the overlay canvas that letterboxes a `frame_w` x `frame_h` frame
/// into a `preview_w` x `preview_h` preview while keeping the frame's aspect
/// ratio.
///
/// Returns `(0.0, 0.0)` when any dimension is zero.
pub fn fit_overlay(frame_w: u32, frame_h: u32, preview_w: f32, preview_h: f32) -> (f32, f32) {
    if frame_w == 0 || frame_h == 0 || preview_w <= 0.0 || preview_h <= 0.0 {
        return (0.0, 0.0);
    }
    let frame_ratio = frame_w as f32 / frame_h as f32;
    let preview_ratio = preview_w / preview_h;
    if frame_ratio >= preview_ratio {
        (preview_w, preview_w / frame_ratio)
    } else {
        (preview_h * frame_ratio, preview_h)
    }
}
