use puzzle_core::geometry::{Outline, PathCommand};
use puzzle_core::{Point, Rect, Size, Surface};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

// Non-deprecated helpers to set canvas styles via property assignment.
pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(color),
    );
}

fn set_line_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let arr = js_sys::Array::new();
    for s in segments {
        arr.push(&JsValue::from_f64(*s));
    }
    let _ = ctx.set_line_dash(&arr);
}

/// Replays an outline as the current canvas path.
fn trace(ctx: &CanvasRenderingContext2d, outline: &Outline) {
    ctx.begin_path();
    for cmd in outline.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathCommand::LineTo(p) => ctx.line_to(p.x, p.y),
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                ctx.bezier_curve_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y)
            }
            PathCommand::Close => ctx.close_path(),
        }
    }
}

/// 2D canvas context painting the level image onto pieces.
pub struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    image: Option<&'a HtmlImageElement>,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d, image: Option<&'a HtmlImageElement>) -> Self {
        CanvasSurface { ctx, image }
    }
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self, size: Size) {
        self.ctx.clear_rect(0.0, 0.0, size.w, size.h);
    }

    fn stroke_guide(&mut self, rect: Rect, color: &str) {
        set_stroke_style(self.ctx, color);
        self.ctx.set_line_width(2.0);
        set_line_dash(self.ctx, &[5.0, 5.0]);
        self.ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
        set_line_dash(self.ctx, &[]);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, by: Point) {
        let _ = self.ctx.translate(by.x, by.y);
    }

    fn set_shadow(&mut self, color: &str, blur: f64, offset: Point) {
        self.ctx.set_shadow_color(color);
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_offset_x(offset.x);
        self.ctx.set_shadow_offset_y(offset.y);
    }

    fn clip(&mut self, outline: &Outline) {
        trace(self.ctx, outline);
        self.ctx.clip();
    }

    fn draw_image(&mut self, src: Rect, dst: Rect) {
        let Some(img) = self.image else {
            return;
        };
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                img, src.x, src.y, src.w, src.h, dst.x, dst.y, dst.w, dst.h,
            );
    }

    fn fill(&mut self, outline: &Outline, color: &str) {
        trace(self.ctx, outline);
        set_fill_style(self.ctx, color);
        self.ctx.fill();
    }

    fn stroke(&mut self, outline: &Outline, color: &str, width: f64) {
        trace(self.ctx, outline);
        set_stroke_style(self.ctx, color);
        self.ctx.set_line_width(width);
        self.ctx.stroke();
    }
}
