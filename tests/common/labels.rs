/// Representative status-line labels, from plain to heavily nested.
pub const CORE_LABELS: &[&str] = &[
    "plain status text",
    "<html><b>Build</b> <c green>passed</c> in <i>42s</i></html>",
    "<bg \"#202020\"><c white>CPU</c> <size 10>load</size> <c \"#ff8800\">87%</c>",
    "H<sub>2</sub>O and E=mc<sup>2</sup> on one <u>line</u>",
    "<font Monospace>0x1F</font> <a>deprecated</a><mark shape=\"Circle\" fill=\"red\"> alert",
    "first line<br><size 24>second</size><br><c random>third</c>",
    "<img src=\"icon.png\" width=16 alt=\"icon\"> with &amp; entities",
    "<size \"30\">big</size>small</c></b></size> stray closers",
];

/// Deeply nested markup, `depth` levels of bold/color/size.
pub fn nested_label(depth: usize) -> String {
    let mut out = String::with_capacity(depth * 40);
    for i in 0..depth {
        out.push_str(&format!(
            "<b><c \"#{:06x}\"><size {}>w{} ",
            (i * 4099) % 0xFF_FFFF,
            10 + i % 12,
            i
        ));
    }
    for _ in 0..depth {
        out.push_str("</size></c></b>");
    }
    out
}
