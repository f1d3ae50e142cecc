use super::flatten::Polyline;

/// Splits each polyline into "on" pieces of a repeating dash pattern.
///
/// `pattern` has even length, non-negative entries and a positive sum. Each
/// polyline restarts the pattern at `offset`. On a closed polyline a dash
/// running over the start point is joined with the first dash.
pub(crate) fn dash_polylines(lines: &[Polyline], offset: f32, pattern: &[f32]) -> Vec<Polyline> {
    let total: f32 = pattern.iter().sum();
    let mut out = Vec::new();

    for line in lines {
        let (mut idx, mut remaining) = start_state(pattern, offset.rem_euclid(total));
        let mut on = idx % 2 == 0;
        let started_on = on;
        let first_dash = out.len();
        let mut split = false;
        let mut cur = Polyline::default();
        if on {
            cur.points.extend(line.points.first().copied());
        }

        for (a, b) in line.edges() {
            let len = a.distance(b);
            let mut t = 0.0f32;
            while len - t > remaining {
                t += remaining;
                let p = a.lerp(b, t / len);
                if on {
                    cur.points.push(p);
                    out.push(std::mem::take(&mut cur));
                } else {
                    cur.points.push(p);
                }
                split = true;
                idx = (idx + 1) % pattern.len();
                remaining = pattern[idx];
                on = !on;
            }
            remaining -= len - t;
            if on {
                cur.points.push(b);
            }
        }

        if !on {
            continue;
        }
        if line.closed && !split {
            // One dash covers the whole contour.
            cur.points.pop();
            cur.closed = true;
            out.push(cur);
        } else if line.closed && started_on && out.len() > first_dash {
            let head = out.remove(first_dash);
            cur.points.extend(head.points.into_iter().skip(1));
            out.push(cur);
        } else if cur.points.len() > 1 {
            out.push(cur);
        }
    }
    out
}

/// Pattern index and length left in that entry after skipping `phase`.
fn start_state(pattern: &[f32], mut phase: f32) -> (usize, f32) {
    let mut idx = 0;
    for _ in 0..pattern.len() * 2 {
        if phase < pattern[idx] || phase <= 0.0 {
            return (idx, pattern[idx] - phase);
        }
        phase -= pattern[idx];
        idx = (idx + 1) % pattern.len();
    }
    (idx, pattern[idx])
}
