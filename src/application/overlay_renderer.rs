// Overlay renderer - Builds the per-frame draw list from overlay state
use crate::domain::draw::{
    format_count, format_signed, layout_label, AlignH, AlignV, Color, DrawCommand, Frame, LabelGrid,
    LabelOptions, Stroke,
};
use crate::domain::gauge::{map_range, AngleRange};
use crate::domain::generator::{
    AuthoringGenerator, ConfirmedGenerator, GaugeSetting, GeneratorArea, GeneratorDetail, COUNT_QUADRANT,
    GENERATED_QUADRANT, RATE_MAX, RATE_MIN, RATE_QUADRANT,
};
use crate::domain::geo::haversine_distance;
use crate::domain::map_view::{MapView, PixelPoint};
use crate::domain::order::{GeoOrder, OrderStatus};
use crate::domain::overlay::Overlay;
use crate::domain::region::{in_view_counts, region_at, Region};
use crate::domain::stopwatch::format_elapsed;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

const GENERATOR_RED: Color = Color(200, 0, 0, 255);
const GENERATED_STROKE: Color = Color(94, 115, 0, 255);
const GENERATED_LABEL: Color = Color(20, 80, 40, 255);
const GENERATE_TOTAL_STROKE: Color = Color(50, 50, 50, 255);
const AREA_FILL: Color = Color(255, 165, 0, 40);
const MAP_CROSS_HAIRS: Color = Color(0, 0, 150, 255);
const GRID_LINES: Color = Color(125, 125, 125, 255);
const REGION_STROKE: Color = Color(0, 200, 200, 255);
const REGION_FILL: Color = Color(0, 200, 200, 50);
const REGION_ALARM_FILL: Color = Color(200, 0, 0, 50);
const REGION_HIGHLIGHT: Color = Color(255, 251, 51, 255);
const ORDER_READY: Color = Color(50, 180, 80, 255);
const ORDER_ALERT: Color = Color(230, 0, 0, 255);
const ORDER_PENDING: Color = Color(70, 110, 230, 255);
const HEADER_KEY: Color = Color(255, 255, 0, 255);
const HEADER_VALUE: Color = Color(255, 255, 255, 255);
const HEADER_BG: Color = Color(0, 0, 75, 125);
const HEADER_ALARM_BG: Color = Color(255, 0, 0, 150);
const RATE_GRAPH_FILL: Color = Color(0, 0, 255, 64);
const RATE_GRAPH_STROKE: Color = Color(0, 0, 50, 255);

const RATE_GRAPH_BORDER: f64 = 50.0;
const RATE_GRAPH_HEIGHT: f64 = 100.0;
const MARKER_WEIGHT: f64 = 10.0;

/// Accumulates draw commands for one frame.
struct DrawList<'a> {
    grid: &'a LabelGrid,
    commands: Vec<DrawCommand>,
}

impl<'a> DrawList<'a> {
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) {
        self.commands.push(DrawCommand::Line { x1, y1, x2, y2, stroke });
    }

    /// Segment along `angle` between two distances from `center`.
    fn ray(&mut self, center: PixelPoint, angle: f64, from: f64, to: f64, stroke: Stroke) {
        let (sin, cos) = angle.sin_cos();
        self.line(
            center.x + from * cos,
            center.y + from * sin,
            center.x + to * cos,
            center.y + to * sin,
            stroke,
        );
    }

    fn point(&mut self, x: f64, y: f64, stroke: Stroke) {
        self.commands.push(DrawCommand::Point { x, y, stroke });
    }

    fn label(&mut self, label: LabelOptions) {
        self.commands.extend(layout_label(self.grid, &label));
    }

    /// Free text label anchored at a pixel position.
    fn text_at(&mut self, at: PixelPoint, h: f64, border: f64, text: String, color: Color, align_h: AlignH) {
        self.label(LabelOptions {
            x: self.grid.to_grid_x(at.x),
            y: self.grid.to_grid_y(at.y),
            h,
            border,
            text: Some(text),
            text_color: color,
            bold: true,
            align_h,
            align_v: AlignV::Center,
            ..LabelOptions::default()
        });
    }

    fn header(&mut self, x: f64, y: f64, w: f64, key: &str, value: String, bg_color: Color) {
        self.label(LabelOptions {
            x,
            y,
            w,
            h: 1.2,
            border: 0.2,
            key: Some(key.to_string()),
            value: Some(value),
            key_color: HEADER_KEY,
            value_color: HEADER_VALUE,
            bg_color,
            ..LabelOptions::default()
        });
    }
}

/// Builds the complete draw list for the current overlay state. Layers are
/// emitted back to front.
pub fn render_frame(overlay: &Overlay) -> Frame {
    let view = overlay.view();
    let mut list = DrawList {
        grid: overlay.label_grid(),
        commands: Vec::new(),
    };

    draw_lat_lng_grid(&mut list, overlay);
    draw_regions(&mut list, view, overlay.regions());
    draw_orders(&mut list, view, overlay.orders());
    draw_cross_hairs(&mut list, view);
    draw_generators(&mut list, overlay);
    draw_region_under_pointer(&mut list, overlay);
    draw_header(&mut list, overlay);
    draw_counts(&mut list, overlay);
    draw_rate_graph(&mut list, overlay);
    draw_stopwatch(&mut list, overlay);

    Frame {
        time_ms: overlay.frame_time_ms(),
        width: view.width,
        height: view.height,
        commands: list.commands,
    }
}

fn draw_lat_lng_grid(list: &mut DrawList, overlay: &Overlay) {
    let view = overlay.view();
    let stroke = Stroke::new(GRID_LINES, 0.5);
    for (_, y) in &overlay.lat_lng_grid().lat_lines {
        list.line(0.0, *y, view.width - 1.0, *y, stroke);
    }
    for (_, x) in &overlay.lat_lng_grid().lng_lines {
        list.line(*x, 0.0, *x, view.height - 1.0, stroke);
    }
}

fn draw_regions(list: &mut DrawList, view: &MapView, regions: &[Region]) {
    for region in regions {
        let top_left = view.lat_lng_to_pixel(region.bounds.top_left);
        let bot_right = view.lat_lng_to_pixel(region.bounds.bot_right);
        list.commands.push(DrawCommand::Rect {
            x: top_left.x,
            y: top_left.y,
            w: bot_right.x - top_left.x,
            h: bot_right.y - top_left.y,
            fill: Some(if region.has_alarms() { REGION_ALARM_FILL } else { REGION_FILL }),
            stroke: Some(Stroke::new(REGION_STROKE, 0.25)),
        });
    }
}

fn order_color(order: &GeoOrder) -> Color {
    match order.status() {
        OrderStatus::ReadyToShip => ORDER_READY,
        _ if order.alarm => ORDER_ALERT,
        OrderStatus::BackOrdered => ORDER_ALERT,
        OrderStatus::Pending => ORDER_PENDING,
    }
}

fn draw_orders(list: &mut DrawList, view: &MapView, orders: &[GeoOrder]) {
    let weight = map_range(view.zoom as f64, 1.0, 18.0, 0.0, 12.0);
    for order in orders {
        let p = view.lat_lng_to_pixel(order.position);
        list.point(p.x, p.y, Stroke::new(order_color(order), weight));
    }
}

fn draw_cross_hairs(list: &mut DrawList, view: &MapView) {
    let x = view.width / 2.0;
    let y = view.height / 2.0;
    let length = view.width.min(view.height) / 4.0;
    let (x1, x2, x3, x4) = (x - length, x - 50.0, x + 50.0, x + length);
    let (y1, y2, y3, y4) = (y - length, y - 50.0, y + 50.0, y + length);

    let thin = Stroke::new(MAP_CROSS_HAIRS, 1.5);
    list.line(x, y - 20.0, x, y - 10.0, thin);
    list.line(x, y + 10.0, x, y + 20.0, thin);
    list.line(x - 20.0, y, x - 10.0, y, thin);
    list.line(x + 10.0, y, x + 20.0, y, thin);
    list.line(x, y1, x, y2, thin);
    list.line(x, y3, x, y4, thin);
    list.line(x1, y, x2, y, thin);

    let dot = Stroke::new(MAP_CROSS_HAIRS, 5.0);
    list.point(x1 - 15.0, y, dot);
    list.point(x, y1 - 15.0, dot);
    list.point(x, y4 + 15.0, dot);

    let scale = Stroke::new(GENERATOR_RED, 3.0);
    list.line(x3, y, x4, y, scale);
    list.line(x3, y + 5.0, x3, y - 10.0, scale);
    list.line(x4, y + 5.0, x4, y - 10.0, scale);

    let a = view.pixel_to_lat_lng(PixelPoint::new(x3, y));
    let b = view.pixel_to_lat_lng(PixelPoint::new(x4, y));
    let distance = haversine_distance(a.lat, a.lng, b.lat, b.lng);
    let text = if distance > 100.0 {
        format_signed(distance)
    } else {
        format_km(distance)
    };
    list.label(LabelOptions {
        x: list.grid.to_grid_x(x4 + 10.0),
        y: list.grid.to_grid_y(y),
        w: 6.5,
        h: 1.6,
        border: 0.3,
        text: Some(format!("{} km", text)),
        text_color: GENERATOR_RED,
        bold: true,
        ..LabelOptions::default()
    });
}

fn draw_generators(list: &mut DrawList, overlay: &Overlay) {
    let view = overlay.view();
    let pointer = overlay.pointer();
    match overlay.authoring() {
        Some(AuthoringGenerator::Idle(idle)) => {
            draw_area(list, view, &idle.preview_area(view, pointer));
        }
        Some(AuthoringGenerator::RadiusSet(generator)) => {
            draw_area(list, view, &generator.area);
            let count = generator.preview_count(view, pointer);
            draw_count_gauge(list, view, &generator.area, count, generator.limits.min);
        }
        Some(AuthoringGenerator::CountSet(generator)) => {
            draw_area(list, view, &generator.area);
            draw_count_gauge(list, view, &generator.area, generator.count, generator.limits.min);
            let rate = generator.preview_rate(view, pointer);
            draw_rate_gauge(list, view, &generator.area, rate);
        }
        None => {}
    }

    for generator in overlay.generators().iter() {
        draw_confirmed(list, view, generator);
    }
}

fn draw_confirmed(list: &mut DrawList, view: &MapView, generator: &ConfirmedGenerator) {
    match generator.detail(view) {
        GeneratorDetail::Hidden => {}
        GeneratorDetail::Marker => {
            let center = view.lat_lng_to_pixel(generator.area.center);
            list.point(center.x, center.y, Stroke::new(GENERATOR_RED, MARKER_WEIGHT));
        }
        GeneratorDetail::Full => {
            draw_area(list, view, &generator.area);
            draw_count_gauge(list, view, &generator.area, generator.count, generator.limits.min);
            draw_rate_gauge(list, view, &generator.area, generator.rate);
            draw_gauge(
                list,
                view,
                &generator.area,
                Gauge {
                    range: GENERATED_QUADRANT.angles(),
                    angle: generator.generated_angle(),
                    filled: true,
                    stroke: GENERATED_STROKE,
                    label_color: GENERATED_LABEL,
                    text: format!("Generated {}", format_count(generator.count_current as u64)),
                    align_h: AlignH::Left,
                },
            );
        }
    }
}

fn draw_area(list: &mut DrawList, view: &MapView, area: &GeneratorArea) {
    let center = view.lat_lng_to_pixel(area.center);
    let radius = area.radius_px(view);

    list.commands.push(DrawCommand::Circle {
        x: center.x,
        y: center.y,
        radius,
        fill: Some(AREA_FILL),
        stroke: Some(Stroke::new(GENERATOR_RED, 1.0)),
    });

    // radius diagonal towards the top right
    list.ray(center, -FRAC_PI_4, 50.0, radius + 20.0, Stroke::new(GENERATOR_RED, 1.25));
    list.ray(center, -FRAC_PI_4, radius - 10.0, radius, Stroke::new(GENERATOR_RED, 4.0));
    list.text_at(
        PixelPoint::new(
            center.x + radius * FRAC_PI_4.cos() + 20.0,
            center.y - radius * FRAC_PI_4.sin() - 20.0,
        ),
        1.6,
        0.3,
        format!("R {} km", format_km(area.radius_km)),
        GENERATOR_RED,
        AlignH::Left,
    );

    draw_area_cross_hairs(list, center, radius);
}

fn draw_area_cross_hairs(list: &mut DrawList, center: PixelPoint, radius: f64) {
    let thin = Stroke::new(GENERATOR_RED, if radius < 200.0 { 1.0 } else { 1.25 });
    let tick = Stroke::new(GENERATOR_RED, if radius < 200.0 { 3.0 } else { 4.0 });

    for quarter in 0..4 {
        let angle = FRAC_PI_4 + quarter as f64 * FRAC_PI_2;
        list.ray(center, angle, 10.0, 20.0, thin);
        // the top right diagonal already carries the radius marker
        if quarter == 3 {
            continue;
        }
        if radius > 50.0 {
            list.ray(center, angle, 50.0, radius, thin);
        }
        list.ray(center, angle, radius - 10.0, radius, tick);
    }

    if radius > 50.0 {
        for quarter in 0..4 {
            let angle = quarter as f64 * FRAC_PI_2;
            list.ray(center, angle, radius, radius + 20.0, thin);
            list.ray(center, angle, radius - 10.0, radius, tick);
        }
    }
}

struct Gauge {
    range: AngleRange,
    angle: f64,
    filled: bool,
    stroke: Color,
    label_color: Color,
    text: String,
    align_h: AlignH,
}

fn draw_count_gauge(list: &mut DrawList, view: &MapView, area: &GeneratorArea, count: GaugeSetting, min: u32) {
    draw_gauge(
        list,
        view,
        area,
        Gauge {
            range: COUNT_QUADRANT.angles(),
            angle: count.angle,
            filled: count.value >= min,
            stroke: GENERATOR_RED,
            label_color: GENERATOR_RED,
            text: format!("Generate {}", format_count(count.value as u64)),
            align_h: AlignH::Right,
        },
    );
}

fn draw_rate_gauge(list: &mut DrawList, view: &MapView, area: &GeneratorArea, rate: GaugeSetting) {
    draw_gauge(
        list,
        view,
        area,
        Gauge {
            range: RATE_QUADRANT.angles(),
            angle: rate.angle,
            filled: (RATE_MIN..=RATE_MAX).contains(&rate.value),
            stroke: GENERATOR_RED,
            label_color: GENERATOR_RED,
            text: format!("Rate {}", format_count(rate.value as u64)),
            align_h: AlignH::Right,
        },
    );
}

fn draw_gauge(list: &mut DrawList, view: &MapView, area: &GeneratorArea, gauge: Gauge) {
    let center = view.lat_lng_to_pixel(area.center);
    let offset = area.radius_px(view) + 10.0;

    list.commands.push(DrawCommand::Arc {
        x: center.x,
        y: center.y,
        radius: offset,
        start: gauge.range.start,
        stop: gauge.range.stop,
        stroke: Stroke::new(gauge.stroke, 2.0),
    });
    if gauge.filled && gauge.angle > gauge.range.start {
        list.commands.push(DrawCommand::Arc {
            x: center.x,
            y: center.y,
            radius: offset,
            start: gauge.range.start,
            stop: gauge.angle,
            stroke: Stroke::new(gauge.stroke, 5.0),
        });
    }
    list.ray(center, gauge.angle, offset - 5.0, offset + 10.0, Stroke::new(gauge.stroke, 2.0));

    let (sin, cos) = gauge.angle.sin_cos();
    list.text_at(
        PixelPoint::new(center.x + (offset + 25.0) * cos, center.y + (offset + 25.0) * sin),
        1.6,
        0.3,
        gauge.text,
        gauge.label_color,
        gauge.align_h,
    );
}

fn draw_region_under_pointer(list: &mut DrawList, overlay: &Overlay) {
    let view = overlay.view();
    let Some(region) = region_at(overlay.regions(), overlay.pointer_lat_lng()) else {
        return;
    };
    let top_left = view.lat_lng_to_pixel(region.bounds.top_left);
    let bot_right = view.lat_lng_to_pixel(region.bounds.bot_right);
    let grid = list.grid;
    let x = grid.to_grid_x(top_left.x);
    let w = grid.to_grid_length(bot_right.x - top_left.x);
    let ink = Color(10, 20, 0, 255);

    if region.region_counts.geo_orders > 0 {
        list.label(LabelOptions {
            x,
            y: grid.to_grid_y(top_left.y) + 0.1,
            w,
            h: 1.0,
            border: 0.1,
            key: Some("GeoOrders".to_string()),
            value: Some(format_count(region.region_counts.geo_orders)),
            key_color: ink,
            value_color: ink,
            bg_color: Color(255, 251, 51, 100),
            ..LabelOptions::default()
        });
    }
    list.label(LabelOptions {
        x,
        y: grid.to_grid_y(bot_right.y) - 1.1,
        w,
        h: 1.0,
        border: 0.1,
        key: Some("Alarms".to_string()),
        value: Some(format_count(region.region_counts.alarms)),
        key_color: ink,
        value_color: ink,
        bg_color: Color(255, 51, 51, 100),
        ..LabelOptions::default()
    });

    list.commands.push(DrawCommand::Rect {
        x: top_left.x,
        y: top_left.y,
        w: bot_right.x - top_left.x,
        h: bot_right.y - top_left.y,
        fill: None,
        stroke: Some(Stroke::new(REGION_HIGHLIGHT, 2.0)),
    });
}

fn draw_header(list: &mut DrawList, overlay: &Overlay) {
    let position = overlay.pointer_lat_lng();
    list.header(2.0, 0.1, 5.0, "Zoom", overlay.view().zoom.to_string(), HEADER_BG);
    list.header(7.05, 0.1, 8.0, "Lat", format!("{:.8}", position.lat), HEADER_BG);
    list.header(15.1, 0.1, 8.0, "Lng", format!("{:.8}", position.lng), HEADER_BG);
}

fn draw_counts(list: &mut DrawList, overlay: &Overlay) {
    let right = list.grid.ticks_horizontal;
    let world = overlay.world_counts();
    let in_view = in_view_counts(overlay.regions());

    list.header(right - 21.13, 0.1, 13.0, "World wide geoOrders", format_count(world.geo_orders), HEADER_BG);
    list.header(right - 8.0, 0.1, 7.0, "Alarms", format_count(world.alarms), HEADER_ALARM_BG);
    list.header(right - 21.13, 1.4, 13.0, "In view geoOrders", format_count(in_view.geo_orders), HEADER_BG);
    list.header(right - 8.0, 1.4, 7.0, "", format_count(in_view.alarms), HEADER_ALARM_BG);
}

fn draw_rate_graph(list: &mut DrawList, overlay: &Overlay) {
    let generated = overlay.generators().generated_total();
    if generated == 0 {
        return;
    }
    let view = overlay.view();
    let rates = overlay.rates();
    let (min, max) = rates.min_max();
    let border = RATE_GRAPH_BORDER;
    let (width, height) = (view.width, view.height);
    let base = height - border;
    let x_at = |index: usize| map_range(index as f64, 0.0, rates.len() as f64, border, width - border);

    let mut points = Vec::with_capacity(rates.len() + 2);
    points.push([border, base]);
    for (i, sample) in rates.samples().enumerate() {
        points.push([x_at(i), map_range(sample.rate, min, max, base, base - RATE_GRAPH_HEIGHT)]);
    }
    points.push([width - border, base]);
    list.commands.push(DrawCommand::Polygon {
        points,
        fill: RATE_GRAPH_FILL,
    });

    if max > 0.0 {
        let stroke = Stroke::new(RATE_GRAPH_STROKE, 2.0);
        let x = width - border;
        let y1 = base - RATE_GRAPH_HEIGHT - 20.0;
        let y2 = y1 + 20.0;
        let y3 = y2 + RATE_GRAPH_HEIGHT;
        let y4 = y3 + 20.0;

        list.line(x - 20.0, y1, x + 20.0, y1, stroke);
        list.line(x + 20.0, y1, x + 20.0, y2, stroke);
        list.line(x + 20.0, y3, x + 20.0, y4, stroke);
        list.line(x - 20.0, y4, x + 20.0, y4, stroke);
        list.line(border, y2, x, y2, Stroke::new(RATE_GRAPH_STROKE, 0.5));
        list.point(x + 20.0, y2, Stroke::new(RATE_GRAPH_STROKE, 6.0));
        list.point(x + 20.0, y3, Stroke::new(RATE_GRAPH_STROKE, 6.0));

        list.text_at(PixelPoint::new(x - 30.0, y1), 1.2, 0.2, format!("Rate max/s {}", format_signed(max)), RATE_GRAPH_STROKE, AlignH::Right);
        list.text_at(PixelPoint::new(x - 30.0, y4), 1.2, 0.2, format!("Rate min/s {}", format_signed(min)), RATE_GRAPH_STROKE, AlignH::Right);

        for index in rates.label_indices() {
            let Some(sample) = rates.sample_at(index) else {
                continue;
            };
            let rate_x = x_at(index);
            let rate_y = y1;
            list.point(rate_x, rate_y + 20.0, Stroke::new(RATE_GRAPH_STROKE, 6.0));
            list.text_at(PixelPoint::new(rate_x, rate_y), 1.2, 0.2, format!("{}/s", format_signed(sample.rate)), RATE_GRAPH_STROKE, AlignH::Center);
        }
    }

    draw_generated_progress(list, view, generated, overlay.generators().generate_total());
}

fn draw_generated_progress(list: &mut DrawList, view: &MapView, generated: u64, target: u64) {
    let offset = RATE_GRAPH_BORDER;
    let base = view.height - offset;
    let generated_x = map_range(generated as f64, 0.0, target as f64, offset, view.width - offset + 2.0);

    if generated_x > offset {
        let bar = Stroke::new(GENERATED_STROKE, 5.0);
        list.line(offset, base, generated_x, base, bar);
        list.line(generated_x, base + 5.0, generated_x, base - 20.0, Stroke::new(GENERATED_STROKE, 2.0));
        list.text_at(
            PixelPoint::new(generated_x - 10.0, base - 20.0),
            1.6,
            0.3,
            format!("Generated {}", format_count(generated)),
            GENERATED_STROKE,
            AlignH::Right,
        );
        list.line(generated_x, base, view.width - offset, base, Stroke::new(GENERATE_TOTAL_STROKE, 2.0));
    }
    list.line(offset, base, view.width - offset, base, Stroke::new(GENERATE_TOTAL_STROKE, 2.0));
}

fn draw_stopwatch(list: &mut DrawList, overlay: &Overlay) {
    let stopwatch = overlay.stopwatch();
    if !stopwatch.is_visible() {
        return;
    }
    let at = stopwatch.location();
    list.commands.push(DrawCommand::Rect {
        x: at.x - 175.0,
        y: at.y - 32.0,
        w: 350.0,
        h: 60.0,
        fill: Some(Color(255, 251, 51, 100)),
        stroke: None,
    });
    list.commands.push(DrawCommand::Text {
        x: at.x,
        y: at.y,
        size: 44.0,
        text: format_elapsed(stopwatch.elapsed_ms(overlay.frame_time_ms())),
        color: Color::rgb(55, 55, 55),
        align_h: AlignH::Center,
        align_v: AlignV::Bottom,
        bold: false,
    });
}

/// Kilometers with thousands separators and at most three decimals.
fn format_km(km: f64) -> String {
    let rounded = (km.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc();
    let fraction = format!("{:.3}", rounded - whole);
    let fraction = fraction
        .trim_start_matches('0')
        .trim_end_matches('0')
        .trim_end_matches('.');
    format!("{}{}", format_count(whole as u64), fraction)
}
